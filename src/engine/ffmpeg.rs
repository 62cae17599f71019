//! FFmpeg-backed media engine
//!
//! Realizes the handle-based engine API with `ffmpeg` child processes.
//! A plain media reference decodes the stream to the null muxer; a media
//! reference carrying a file sink stream-copies into the requested container.

use super::options::MediaOptions;
use super::{DisplaySurface, EngineError, EngineHandle, EngineResult, MediaEngine, MediaRef};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(3);
const DEFAULT_STARTUP_CHECK: Duration = Duration::from_millis(500);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Engine-level switches recovered from the creation flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EngineFlags {
    rtsp_tcp: bool,
    hwaccel: bool,
}

impl EngineFlags {
    fn parse(options: &[String]) -> Self {
        let mut flags = Self::default();
        for option in options {
            match option.as_str() {
                "--rtsp-tcp" => flags.rtsp_tcp = true,
                "--avcodec-hw=any" => flags.hwaccel = true,
                // Frame-drop policy has no ffmpeg equivalent for stream copy
                "--no-drop-late-frames" | "--no-skip-frames" => {}
                other => tracing::debug!("Ignoring unsupported engine flag: {}", other),
            }
        }
        flags
    }
}

struct EngineInstance {
    flags: EngineFlags,
    surface: Option<DisplaySurface>,
    media: Option<MediaRef>,
    process: Option<Child>,
}

struct MediaEntry {
    engine: EngineHandle,
    uri: String,
    options: MediaOptions,
}

/// Media engine that drives `ffmpeg` processes
pub struct FfmpegEngine {
    binary: PathBuf,
    stop_grace: Duration,
    startup_check: Duration,
    engines: HashMap<u64, EngineInstance>,
    media: HashMap<u64, MediaEntry>,
    next_id: u64,
}

impl FfmpegEngine {
    /// Create an engine that runs `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self::with_binary("ffmpeg")
    }

    /// Create an engine that runs the given ffmpeg binary
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            stop_grace: DEFAULT_STOP_GRACE,
            startup_check: DEFAULT_STARTUP_CHECK,
            engines: HashMap::new(),
            media: HashMap::new(),
            next_id: 0,
        }
    }

    /// How long `stop` waits for ffmpeg to finalize before killing it
    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// How long `play` watches a new process for an early exit
    pub fn with_startup_check(mut self, window: Duration) -> Self {
        self.startup_check = window;
        self
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn instance(&mut self, engine: EngineHandle) -> EngineResult<&mut EngineInstance> {
        self.engines
            .get_mut(&engine.0)
            .ok_or(EngineError::UnknownEngine(engine.0))
    }

    /// A process that exits inside `window` never got the stream going
    fn check_startup(child: &mut Child, window: Duration) -> EngineResult<()> {
        let deadline = Instant::now() + window;
        loop {
            match child.try_wait()? {
                Some(status) => {
                    return Err(EngineError::Rejected(format!(
                        "ffmpeg exited during startup with {}",
                        status
                    )))
                }
                None if Instant::now() < deadline => std::thread::sleep(STOP_POLL_INTERVAL),
                None => return Ok(()),
            }
        }
    }

    /// Ask ffmpeg to quit so the container trailer gets written, then kill it
    fn stop_process(mut child: Child, grace: Duration) {
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(b"q") {
                tracing::debug!("FFmpeg stdin closed before quit request: {}", e);
            }
        }

        let deadline = Instant::now() + grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    tracing::debug!("FFmpeg exited with {}", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => std::thread::sleep(STOP_POLL_INTERVAL),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to poll FFmpeg process: {}", e);
                    break;
                }
            }
        }

        tracing::warn!("FFmpeg did not exit within {:?}, killing it", grace);
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// ffmpeg muxer name for a recording container
fn muxer_name(container: &str) -> &str {
    match container {
        "mkv" => "matroska",
        "ts" => "mpegts",
        other => other,
    }
}

/// Build the ffmpeg argument list for one playback
fn build_args(flags: EngineFlags, uri: &str, options: &MediaOptions) -> Vec<String> {
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];

    if flags.rtsp_tcp && uri.starts_with("rtsp://") {
        args.extend(["-rtsp_transport".into(), "tcp".into()]);
    }
    if flags.hwaccel || options.hardware_decoding {
        args.extend(["-hwaccel".into(), "auto".into()]);
    }
    if let Some(ms) = options.network_caching_ms {
        args.extend(["-max_delay".into(), (u64::from(ms) * 1000).to_string()]);
    }

    args.extend(["-i".into(), uri.to_string()]);

    match &options.file_sink {
        Some(sink) => {
            args.extend([
                "-c".into(),
                "copy".into(),
                "-f".into(),
                muxer_name(&sink.mux).to_string(),
                "-y".into(),
                sink.path.to_string_lossy().to_string(),
            ]);
        }
        None => {
            args.extend(["-f".into(), "null".into(), "-".into()]);
        }
    }

    args
}

impl MediaEngine for FfmpegEngine {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn create_engine(&mut self, options: &[String]) -> EngineResult<EngineHandle> {
        let id = self.allocate_id();
        let flags = EngineFlags::parse(options);
        self.engines.insert(
            id,
            EngineInstance {
                flags,
                surface: None,
                media: None,
                process: None,
            },
        );
        tracing::debug!("Created ffmpeg engine {} with {:?}", id, flags);
        Ok(EngineHandle(id))
    }

    fn attach(&mut self, engine: EngineHandle, surface: &DisplaySurface) -> EngineResult<()> {
        let instance = self.instance(engine)?;
        if let Some(current) = &instance.surface {
            return Err(EngineError::Rejected(format!(
                "surface {} already attached",
                current.id
            )));
        }
        // Output is headless; the surface is tracked for bookkeeping only
        tracing::debug!("Attached surface '{}' to engine {}", surface.label, engine.0);
        instance.surface = Some(surface.clone());
        Ok(())
    }

    fn detach(&mut self, engine: EngineHandle) -> EngineResult<()> {
        self.instance(engine)?.surface = None;
        Ok(())
    }

    fn create_media(
        &mut self,
        engine: EngineHandle,
        uri: &str,
        options: &[String],
    ) -> EngineResult<MediaRef> {
        if !self.engines.contains_key(&engine.0) {
            return Err(EngineError::UnknownEngine(engine.0));
        }
        if uri.trim().is_empty() {
            return Err(EngineError::Rejected("empty media URI".to_string()));
        }

        let id = self.allocate_id();
        self.media.insert(
            id,
            MediaEntry {
                engine,
                uri: uri.to_string(),
                options: MediaOptions::parse(options),
            },
        );
        Ok(MediaRef(id))
    }

    fn set_media(&mut self, engine: EngineHandle, media: MediaRef) -> EngineResult<()> {
        match self.media.get(&media.0) {
            Some(entry) if entry.engine == engine => {}
            Some(_) => {
                return Err(EngineError::Rejected(format!(
                    "media {} belongs to another engine",
                    media.0
                )))
            }
            None => return Err(EngineError::UnknownMedia(media.0)),
        }
        self.instance(engine)?.media = Some(media);
        Ok(())
    }

    fn play(&mut self, engine: EngineHandle) -> EngineResult<()> {
        let grace = self.stop_grace;
        let startup = self.startup_check;
        let instance = self
            .engines
            .get_mut(&engine.0)
            .ok_or(EngineError::UnknownEngine(engine.0))?;

        let media = instance.media.ok_or(EngineError::NoMedia(engine.0))?;
        let entry = self
            .media
            .get(&media.0)
            .ok_or(EngineError::UnknownMedia(media.0))?;

        if let Some(child) = instance.process.take() {
            Self::stop_process(child, grace);
        }

        let args = build_args(instance.flags, &entry.uri, &entry.options);
        tracing::debug!("Spawning {:?} {}", self.binary, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {}", self.binary.display(), e)))?;
        Self::check_startup(&mut child, startup)?;

        tracing::info!("FFmpeg playing {} (pid {})", entry.uri, child.id());
        instance.process = Some(child);
        Ok(())
    }

    fn stop(&mut self, engine: EngineHandle) -> EngineResult<()> {
        let grace = self.stop_grace;
        if let Some(child) = self.instance(engine)?.process.take() {
            Self::stop_process(child, grace);
        }
        Ok(())
    }

    fn release_media(&mut self, media: MediaRef) -> EngineResult<()> {
        let entry = self
            .media
            .remove(&media.0)
            .ok_or(EngineError::UnknownMedia(media.0))?;
        if let Some(instance) = self.engines.get_mut(&entry.engine.0) {
            if instance.media == Some(media) {
                instance.media = None;
            }
        }
        Ok(())
    }

    fn release_engine(&mut self, engine: EngineHandle) -> EngineResult<()> {
        let instance = self
            .engines
            .remove(&engine.0)
            .ok_or(EngineError::UnknownEngine(engine.0))?;
        if let Some(child) = instance.process {
            Self::stop_process(child, self.stop_grace);
        }
        self.media.retain(|_, entry| entry.engine != engine);
        Ok(())
    }
}

impl Drop for FfmpegEngine {
    fn drop(&mut self) {
        for instance in self.engines.values_mut() {
            if let Some(mut child) = instance.process.take() {
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }
}
