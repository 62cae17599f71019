//! Command-line interface

use clap::Parser;
use std::path::PathBuf;

/// Play an RTSP stream and optionally record it
#[derive(Debug, Parser)]
#[command(name = "rtsp-viewer", version, about)]
pub struct Cli {
    /// Stream URL, e.g. rtsp://camera.local/live
    pub url: String,

    /// Record the stream to <NAME>-<millis>.<container>
    #[arg(long, value_name = "NAME")]
    pub record: Option<String>,

    /// Stop recording after this many seconds instead of waiting for Ctrl-C
    #[arg(long, value_name = "SECS", requires = "record")]
    pub duration: Option<u64>,

    /// JSON player configuration
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory for recordings, overrides the configuration
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// ffmpeg binary to drive
    #[arg(long, value_name = "PATH", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record() {
        let cli = Cli::try_parse_from([
            "rtsp-viewer",
            "rtsp://cam/live",
            "--record",
            "clip",
            "--duration",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.url, "rtsp://cam/live");
        assert_eq!(cli.record.as_deref(), Some("clip"));
        assert_eq!(cli.duration, Some(10));
        assert_eq!(cli.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_duration_requires_record() {
        assert!(Cli::try_parse_from(["rtsp-viewer", "rtsp://cam/live", "--duration", "5"]).is_err());
    }
}
