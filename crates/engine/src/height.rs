//! Keeps the host frame height in step with the rendered document.
//!
//! [`HeightMonitor::check_height`] is one frame's worth of work: compare the
//! body height with the last reported value and report it when it changed.
//! [`HeightSyncTask`] runs that check once per frame until it is cancelled.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::host::{HostBridge, RenderSurface};

/// Roughly one display frame at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Compares the rendered height with the last height reported to the host.
pub struct HeightMonitor {
    bridge: Arc<dyn HostBridge>,
    surface: Arc<dyn RenderSurface>,
    last_height: Mutex<Option<u32>>,
}

impl HeightMonitor {
    pub fn new(bridge: Arc<dyn HostBridge>, surface: Arc<dyn RenderSurface>) -> Self {
        Self {
            bridge,
            surface,
            last_height: Mutex::new(None),
        }
    }

    /// Report the body height to the host if it changed since the last report.
    ///
    /// Returns `true` when a report was sent.
    pub fn check_height(&self) -> bool {
        let height = self.surface.body_height();
        {
            let mut last_height = self.last_height.lock().unwrap_or_else(PoisonError::into_inner);
            if *last_height == Some(height) {
                return false;
            }
            *last_height = Some(height);
        }
        trace!(height, "reporting frame height");
        self.bridge.set_height(height);
        true
    }

    /// The height most recently reported to the host.
    pub fn last_height(&self) -> Option<u32> {
        *self.last_height.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background task running [`HeightMonitor::check_height`] once per frame.
#[derive(Debug)]
pub struct HeightSyncTask {
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl HeightSyncTask {
    /// Start polling on the current Tokio runtime.
    pub fn spawn(monitor: Arc<HeightMonitor>, frame_interval: Duration, cancellation_token: CancellationToken) -> Self {
        let frame_interval = frame_interval.max(Duration::from_millis(1));
        let handle = tokio::spawn({
            let shutdown = cancellation_token.child_token();
            async move {
                let mut ticker = tokio::time::interval(frame_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            monitor.check_height();
                        }
                    }
                }
                debug!("height sync stopped");
            }
        });

        Self {
            cancellation_token,
            handle,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel polling and wait for the task to finish.
    pub async fn stop(self) -> Result<(), JoinError> {
        self.cancellation_token.cancel();
        self.handle.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryHost;

    fn monitor_for(host: &Arc<MemoryHost>) -> HeightMonitor {
        HeightMonitor::new(host.clone(), host.clone())
    }

    #[test]
    fn reports_only_changed_heights() {
        let host = Arc::new(MemoryHost::default().with_body_height(400));
        let monitor = monitor_for(&host);

        assert!(monitor.check_height());
        assert_eq!(host.reported_heights(), vec![400]);

        host.set_body_height(420);
        assert!(monitor.check_height());
        assert_eq!(host.reported_heights(), vec![400, 420]);

        assert!(!monitor.check_height());
        assert_eq!(host.reported_heights(), vec![400, 420]);
        assert_eq!(monitor.last_height(), Some(420));
    }

    #[test]
    fn first_check_reports_even_zero_height() {
        let host = Arc::new(MemoryHost::default());
        let monitor = monitor_for(&host);
        assert!(monitor.check_height());
        assert_eq!(host.reported_heights(), vec![0]);
    }

    #[tokio::test(start_paused = true)]
    async fn task_polls_each_frame_until_stopped() {
        let host = Arc::new(MemoryHost::default().with_body_height(500));
        let monitor = Arc::new(monitor_for(&host));
        let task = HeightSyncTask::spawn(monitor, DEFAULT_FRAME_INTERVAL, CancellationToken::new());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(host.reported_heights(), vec![500]);

        host.set_body_height(520);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(host.reported_heights(), vec![500, 520]);
        assert!(task.is_running());

        task.stop().await.expect("height task joins");

        host.set_body_height(640);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(host.reported_heights(), vec![500, 520]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_parent_token_stops_polling() {
        let host = Arc::new(MemoryHost::default().with_body_height(300));
        let token = CancellationToken::new();
        let task = HeightSyncTask::spawn(Arc::new(monitor_for(&host)), DEFAULT_FRAME_INTERVAL, token.clone());

        tokio::time::sleep(Duration::from_millis(5)).await;
        token.cancel();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(!task.is_running());
        task.stop().await.expect("height task joins");
    }
}
