//! Engine and media option strings
//!
//! Engines take their configuration as flat option strings. This module
//! builds them from typed settings and parses them back for backends that
//! need to interpret them.

use std::path::{Path, PathBuf};

/// Engine flags used when no configuration overrides them
pub const DEFAULT_ENGINE_FLAGS: [&str; 4] = [
    "--no-drop-late-frames",
    "--no-skip-frames",
    "--avcodec-hw=any",
    "--rtsp-tcp",
];

/// Containers a recording can be written in, by file extension
pub const RECORDING_CONTAINERS: [&str; 5] = ["mp4", "mkv", "ts", "mov", "flv"];

/// Default network buffering latency in milliseconds
pub const DEFAULT_NETWORK_CACHING_MS: u32 = 300;

const NETWORK_CACHING_PREFIX: &str = ":network-caching=";
const HW_DECODE_OPTION: &str = ":avcodec-hw=any";
const SOUT_PREFIX: &str = ":sout=";

/// Default engine flags as owned strings
pub fn default_engine_flags() -> Vec<String> {
    DEFAULT_ENGINE_FLAGS.iter().map(|s| s.to_string()).collect()
}

/// File sink requested through a stream-output directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSink {
    pub path: PathBuf,
    pub mux: String,
}

/// Typed view of the per-media options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaOptions {
    /// Prefer hardware decoding
    pub hardware_decoding: bool,

    /// Network buffering latency
    pub network_caching_ms: Option<u32>,

    /// Duplicate the stream into this file while rendering
    pub file_sink: Option<FileSink>,
}

impl MediaOptions {
    /// Options for plain viewing
    pub fn playback(hardware_decoding: bool, network_caching_ms: u32) -> Self {
        Self {
            hardware_decoding,
            network_caching_ms: Some(network_caching_ms),
            file_sink: None,
        }
    }

    /// Add a file sink to these options
    pub fn with_file_sink(mut self, path: &Path, mux: &str) -> Self {
        self.file_sink = Some(FileSink {
            path: path.to_path_buf(),
            mux: mux.to_string(),
        });
        self
    }

    /// Render as engine option strings
    pub fn to_options(&self) -> Vec<String> {
        let mut options = Vec::new();
        if self.hardware_decoding {
            options.push(HW_DECODE_OPTION.to_string());
        }
        if let Some(ms) = self.network_caching_ms {
            options.push(format!("{}{}", NETWORK_CACHING_PREFIX, ms));
        }
        if let Some(sink) = &self.file_sink {
            options.push(stream_output_directive(&sink.path, &sink.mux));
        }
        options
    }

    /// Parse engine option strings. Unrecognized options are ignored.
    pub fn parse(options: &[String]) -> Self {
        let mut parsed = Self::default();
        for option in options {
            if option == HW_DECODE_OPTION {
                parsed.hardware_decoding = true;
            } else if let Some(value) = option.strip_prefix(NETWORK_CACHING_PREFIX) {
                match value.parse() {
                    Ok(ms) => parsed.network_caching_ms = Some(ms),
                    Err(_) => tracing::warn!("Ignoring invalid network caching value: {}", value),
                }
            } else if option.starts_with(SOUT_PREFIX) {
                parsed.file_sink = parse_file_sink(option);
            } else {
                tracing::debug!("Ignoring unrecognized media option: {}", option);
            }
        }
        parsed
    }
}

/// Build a directive that renders to the display and writes a copy to `path`.
///
/// Quotes and backslashes in the path are backslash-escaped.
pub fn stream_output_directive(path: &Path, mux: &str) -> String {
    let mut quoted = String::new();
    for c in path.display().to_string().chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!(
        "{}#duplicate{{dst=display,dst=standard{{access=file,mux={},dst='{}'}}}}",
        SOUT_PREFIX, mux, quoted
    )
}

/// Recover the file sink from a stream-output directive
pub fn parse_file_sink(directive: &str) -> Option<FileSink> {
    let body = directive.strip_prefix(SOUT_PREFIX)?;
    let standard = &body[body.find("access=file")?..];

    let mux = standard
        .find("mux=")
        .map(|i| &standard[i + 4..])
        .and_then(|rest| rest.split([',', '}']).next())
        .filter(|m| !m.is_empty())
        .unwrap_or("mp4")
        .to_string();

    let dst_start = standard.find("dst='")? + 5;
    let mut path = String::new();
    let mut chars = standard[dst_start..].chars();
    loop {
        match chars.next()? {
            '\\' => path.push(chars.next()?),
            '\'' => break,
            c => path.push(c),
        }
    }
    if path.is_empty() {
        return None;
    }

    Some(FileSink {
        path: PathBuf::from(path),
        mux,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_options() {
        let options = MediaOptions::playback(true, 300).to_options();
        assert_eq!(options, vec![":avcodec-hw=any", ":network-caching=300"]);
    }

    #[test]
    fn test_directive_format() {
        let directive = stream_output_directive(Path::new("/data/clip-1.mp4"), "mp4");
        assert_eq!(
            directive,
            ":sout=#duplicate{dst=display,dst=standard{access=file,mux=mp4,dst='/data/clip-1.mp4'}}"
        );
    }

    #[test]
    fn test_parse_file_sink() {
        let directive = stream_output_directive(Path::new("/tmp/rec/clip-42.mkv"), "mkv");
        let sink = parse_file_sink(&directive).unwrap();
        assert_eq!(sink.path, PathBuf::from("/tmp/rec/clip-42.mkv"));
        assert_eq!(sink.mux, "mkv");
    }

    #[test]
    fn test_parse_file_sink_quoted_path() {
        let path = Path::new("/rec/bob's cam-1.mp4");
        let directive = stream_output_directive(path, "mp4");
        assert!(directive.ends_with("dst='/rec/bob\\'s cam-1.mp4'}}"));
        assert_eq!(parse_file_sink(&directive).unwrap().path, path);

        // Unterminated quote is not a sink
        assert!(parse_file_sink(":sout=#standard{access=file,dst='/rec/a").is_none());
    }

    #[test]
    fn test_parse_file_sink_display_only() {
        assert!(parse_file_sink(":sout=#display").is_none());
        assert!(parse_file_sink(":network-caching=300").is_none());
    }

    #[test]
    fn test_parse_options() {
        let options = MediaOptions::playback(true, 150)
            .with_file_sink(Path::new("/tmp/a.mp4"), "mp4")
            .to_options();
        let parsed = MediaOptions::parse(&options);
        assert!(parsed.hardware_decoding);
        assert_eq!(parsed.network_caching_ms, Some(150));
        assert_eq!(parsed.file_sink.unwrap().path, PathBuf::from("/tmp/a.mp4"));
    }

    #[test]
    fn test_parse_ignores_bad_caching() {
        let parsed = MediaOptions::parse(&[":network-caching=soon".to_string()]);
        assert_eq!(parsed.network_caching_ms, None);
    }
}
