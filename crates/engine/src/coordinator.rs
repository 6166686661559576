//! The color selection workflow.
//!
//! [`Coordinator::initialize`] connects to the host, reads the stored value and
//! instance parameters, fetches the palette content item, derives the flat
//! color list and reconciles the stored value against it. Any failure along
//! the way replaces the palette with a failure marker; nothing is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use brand_color_api::{ContentClientConfig, ContentError, ContentSourceFactory};
use brand_color_types::{ColorEntry, ExtensionParameters, Palette};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::height::{DEFAULT_FRAME_INTERVAL, HeightMonitor, HeightSyncTask};
use crate::host::{BridgeError, HostBridge, HostConnector, RenderSurface};
use crate::state::ExtensionState;

/// Any failure while loading the palette.
///
/// Every variant displays only the underlying message; the failure palette
/// embeds it verbatim.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("{0}")]
    Parameters(serde_json::Error),

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Errors from [`Coordinator::select_color`].
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("host bridge is not connected yet")]
    NotConnected,

    #[error("failed to write field value: {0}")]
    Bridge(#[from] BridgeError),
}

/// How a call to [`Coordinator::initialize`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// The palette loaded and height sync is running.
    Ready,
    /// Loading failed; the palette now carries the failure marker.
    Failed(String),
    /// `initialize` had already been called on this coordinator.
    AlreadyStarted,
}

/// Owns the selection workflow for one extension session.
pub struct Coordinator {
    connector: Arc<dyn HostConnector>,
    content_sources: Arc<dyn ContentSourceFactory>,
    surface: Arc<dyn RenderSurface>,
    frame_interval: Duration,
    started: AtomicBool,
    bridge: OnceLock<Arc<dyn HostBridge>>,
    height_monitor: OnceLock<Arc<HeightMonitor>>,
    height_task: Mutex<Option<HeightSyncTask>>,
    shutdown: CancellationToken,
    state: watch::Sender<ExtensionState>,
}

impl Coordinator {
    pub fn new(
        connector: Arc<dyn HostConnector>,
        content_sources: Arc<dyn ContentSourceFactory>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            connector,
            content_sources,
            surface,
            frame_interval: DEFAULT_FRAME_INTERVAL,
            started: AtomicBool::new(false),
            bridge: OnceLock::new(),
            height_monitor: OnceLock::new(),
            height_task: Mutex::new(None),
            shutdown: CancellationToken::new(),
            state: watch::Sender::new(ExtensionState::default()),
        }
    }

    /// Override the polling interval of the height sync task.
    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ExtensionState {
        self.state.borrow().clone()
    }

    /// Receive a notification every time the state changes.
    pub fn subscribe(&self) -> watch::Receiver<ExtensionState> {
        self.state.subscribe()
    }

    /// Load the palette and reconcile the stored value. Runs once per session.
    pub async fn initialize(&self) -> InitializeOutcome {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("initialize called more than once; ignoring");
            return InitializeOutcome::AlreadyStarted;
        }

        match self.load().await {
            Ok(()) => {
                self.start_height_sync();
                InitializeOutcome::Ready
            }
            Err(error) => {
                let message = error.to_string();
                warn!(error = %message, "failed to load brand colors");
                self.state.send_modify(|state| state.palette = Palette::failed(&message));
                InitializeOutcome::Failed(message)
            }
        }
    }

    async fn load(&self) -> Result<(), InitializationError> {
        let bridge = self.connector.connect().await?;
        bridge.start_auto_resizer();
        let bridge = Arc::clone(self.bridge.get_or_init(|| bridge));

        let raw_value = bridge.get_value().await?;
        let provisional = raw_value.as_deref().map(ColorEntry::unrecognized);
        self.state.send_modify(|state| state.selected = provisional);

        let params: ExtensionParameters =
            serde_json::from_value(bridge.instance_params()).map_err(InitializationError::Parameters)?;
        self.state.send_modify(|state| state.params = Some(params.clone()));

        let config =
            ContentClientConfig::new(params.account_or_default()).with_staging_environment(bridge.staging_environment());
        debug!(account = %config.account, content_id = %params.content_id, "fetching palette");
        let source = self.content_sources.create(config)?;
        let mut palette: Palette = source.get_content_item(&params.content_id).await?.decode()?;

        palette.prepare(&params);
        let selected = palette.find_existing_color(raw_value.as_deref(), params.use_names);
        info!(palette = %palette.name, colors = palette.colors.len(), "brand colors loaded");

        self.state.send_modify(|state| {
            state.palette = palette;
            state.selected = selected;
        });
        Ok(())
    }

    fn start_height_sync(&self) {
        let Some(bridge) = self.bridge.get() else {
            return;
        };
        let monitor = Arc::clone(
            self.height_monitor
                .get_or_init(|| Arc::new(HeightMonitor::new(Arc::clone(bridge), Arc::clone(&self.surface)))),
        );
        let task = HeightSyncTask::spawn(monitor, self.frame_interval, self.shutdown.child_token());
        *self.height_task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Persist `entry` to the host field and make it the active selection.
    ///
    /// `None` clears both. The entry is not checked against the palette.
    pub fn select_color(&self, entry: Option<ColorEntry>) -> Result<(), SelectionError> {
        let bridge = self.bridge.get().ok_or(SelectionError::NotConnected)?;
        let use_names = self.state.borrow().use_names();

        let key = entry.as_ref().map(|entry| entry.key(use_names));
        bridge.set_value(key)?;
        debug!(value = ?key, "field value written");

        self.state.send_modify(|state| state.selected = entry);
        Ok(())
    }

    /// Reconcile a stored key against the current palette.
    pub fn find_existing_color(&self, key: Option<&str>) -> Option<ColorEntry> {
        let state = self.state.borrow();
        state.palette.find_existing_color(key, state.use_names())
    }

    /// Run a single height check outside the background task.
    ///
    /// Does nothing until initialization has succeeded.
    pub fn check_height(&self) -> bool {
        self.height_monitor.get().is_some_and(|monitor| monitor.check_height())
    }

    pub fn is_height_sync_running(&self) -> bool {
        self.height_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(HeightSyncTask::is_running)
    }

    /// Stop background work started by [`Coordinator::initialize`].
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let task = self.height_task.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(task) = task
            && let Err(error) = task.stop().await
        {
            warn!(%error, "height sync task failed");
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
