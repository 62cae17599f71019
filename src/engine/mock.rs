//! Recording mock engine for tests

use super::{DisplaySurface, EngineError, EngineHandle, EngineResult, MediaEngine, MediaRef};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// One call made against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateEngine(Vec<String>),
    Attach(u64),
    Detach,
    CreateMedia { uri: String, options: Vec<String> },
    SetMedia(u64),
    Play,
    Stop,
    ReleaseMedia(u64),
    ReleaseEngine,
}

/// Engine call that can be switched to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Attach,
    Detach,
    CreateMedia,
    SetMedia,
    Play,
    Stop,
}

#[derive(Debug, Default)]
struct Shared {
    calls: Vec<Call>,
    live_media: HashSet<u64>,
    double_released: bool,
    failing: HashSet<FailPoint>,
}

impl Shared {
    fn check(&self, point: FailPoint) -> EngineResult<()> {
        if self.failing.contains(&point) {
            return Err(EngineError::Rejected(format!("{:?} refused", point)));
        }
        Ok(())
    }
}

/// Engine that records every call and can be told to fail.
///
/// Clones share the same log so a test can keep one while the controller
/// owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    shared: Arc<Mutex<Shared>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.shared.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.lock().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.shared.lock().calls.iter().filter(|c| predicate(*c)).count()
    }

    pub fn live_media(&self) -> usize {
        self.shared.lock().live_media.len()
    }

    pub fn double_released(&self) -> bool {
        self.shared.lock().double_released
    }

    pub fn set_fail(&self, point: FailPoint, fail: bool) {
        let mut shared = self.shared.lock();
        if fail {
            shared.failing.insert(point);
        } else {
            shared.failing.remove(&point);
        }
    }

    fn next(&self) -> u64 {
        let mut id = self.next_id.lock();
        *id += 1;
        *id
    }
}

impl MediaEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_engine(&mut self, options: &[String]) -> EngineResult<EngineHandle> {
        self.shared.lock().calls.push(Call::CreateEngine(options.to_vec()));
        Ok(EngineHandle(self.next()))
    }

    fn attach(&mut self, _engine: EngineHandle, surface: &DisplaySurface) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::Attach(surface.id));
        shared.check(FailPoint::Attach)
    }

    fn detach(&mut self, _engine: EngineHandle) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::Detach);
        shared.check(FailPoint::Detach)
    }

    fn create_media(
        &mut self,
        _engine: EngineHandle,
        uri: &str,
        options: &[String],
    ) -> EngineResult<MediaRef> {
        let id = self.next();
        let mut shared = self.shared.lock();
        shared.calls.push(Call::CreateMedia {
            uri: uri.to_string(),
            options: options.to_vec(),
        });
        shared.check(FailPoint::CreateMedia)?;
        shared.live_media.insert(id);
        Ok(MediaRef(id))
    }

    fn set_media(&mut self, _engine: EngineHandle, media: MediaRef) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::SetMedia(media.0));
        shared.check(FailPoint::SetMedia)
    }

    fn play(&mut self, _engine: EngineHandle) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::Play);
        shared.check(FailPoint::Play)
    }

    fn stop(&mut self, _engine: EngineHandle) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::Stop);
        shared.check(FailPoint::Stop)
    }

    fn release_media(&mut self, media: MediaRef) -> EngineResult<()> {
        let mut shared = self.shared.lock();
        shared.calls.push(Call::ReleaseMedia(media.0));
        if !shared.live_media.remove(&media.0) {
            shared.double_released = true;
        }
        Ok(())
    }

    fn release_engine(&mut self, _engine: EngineHandle) -> EngineResult<()> {
        self.shared.lock().calls.push(Call::ReleaseEngine);
        Ok(())
    }
}
