//! Recording duration timer
//!
//! A cancellable periodic task that writes the elapsed recording time into
//! the published session snapshot.

use super::state::SessionSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct RecordingTimer {
    task: Option<JoinHandle<()>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking every `interval`, replacing any running timer.
    ///
    /// Returns false when no tokio runtime is available to host the task.
    pub fn start(&mut self, snapshot_tx: Arc<watch::Sender<SessionSnapshot>>, interval: Duration) -> bool {
        self.cancel();

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::debug!("No async runtime, recording duration will not be tracked");
                return false;
            }
        };

        let started = Instant::now();
        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let elapsed = started.elapsed().as_millis() as u64;
                // Late ticks after a stop must not resurrect the duration
                snapshot_tx.send_modify(|snapshot| {
                    if snapshot.is_recording {
                        snapshot.recording_duration_ms = elapsed;
                    }
                });
            }
        }));
        true
    }

    /// Stop the timer. Safe to call when nothing is running.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_channel() -> (Arc<watch::Sender<SessionSnapshot>>, watch::Receiver<SessionSnapshot>) {
        let (tx, rx) = watch::channel(SessionSnapshot {
            is_playing: true,
            is_recording: true,
            ..Default::default()
        });
        (Arc::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_tracks_elapsed_time() {
        let (tx, rx) = recording_channel();
        let mut timer = RecordingTimer::new();
        assert!(timer.start(tx, Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let duration = rx.borrow().recording_duration_ms;
        assert!((3_000..=3_500).contains(&duration), "duration was {}", duration);
        assert!(timer.is_running());

        timer.cancel();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_stops_updating() {
        let (tx, rx) = recording_channel();
        let mut timer = RecordingTimer::new();
        timer.start(tx.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        timer.cancel();
        tx.send_modify(|s| s.recording_duration_ms = 0);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.borrow().recording_duration_ms, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ignores_ticks_when_not_recording() {
        let (tx, rx) = recording_channel();
        let mut timer = RecordingTimer::new();
        timer.start(tx.clone(), Duration::from_secs(1));

        tx.send_modify(|s| s.is_recording = false);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.borrow().recording_duration_ms, 0);
    }

    #[test]
    fn test_start_without_runtime() {
        let (tx, _rx) = recording_channel();
        let mut timer = RecordingTimer::new();
        assert!(!timer.start(tx, Duration::from_secs(1)));
        assert!(!timer.is_running());
    }
}
