//! Contracts of the editor host the extension runs inside.
//!
//! The host owns the stored field value, the instance parameters and the
//! frame the extension renders into. These traits describe exactly what the
//! coordinator consumes from it; the transport behind them is the host's
//! concern.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Errors reported by the host bridge.
///
/// Display strings are the host's message only so they can be shown to the
/// editor unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The bridge could not be acquired.
    #[error("{0}")]
    Unavailable(String),
    /// A call on an acquired bridge failed.
    #[error("{0}")]
    Call(String),
}

/// Field, parameter and frame access provided by the host.
#[async_trait::async_trait]
pub trait HostBridge: Send + Sync {
    /// Read the value currently stored in the field.
    async fn get_value(&self) -> Result<Option<String>, BridgeError>;

    /// Write a new field value; `None` clears the field.
    fn set_value(&self, value: Option<&str>) -> Result<(), BridgeError>;

    /// The raw instance parameter bag configured for this extension.
    fn instance_params(&self) -> Value;

    /// Staging environment host when the editor is previewing unpublished content.
    fn staging_environment(&self) -> Option<String>;

    /// Ask the host to start its own frame resizing.
    fn start_auto_resizer(&self);

    /// Report the rendered height of the extension frame.
    fn set_height(&self, height: u32);
}

/// Asynchronously acquires the host bridge.
#[async_trait::async_trait]
pub trait HostConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn HostBridge>, BridgeError>;
}

/// Reports the rendered height of the document body.
pub trait RenderSurface: Send + Sync {
    fn body_height(&self) -> u32;
}

/// Connector for a bridge that is already available.
#[derive(Clone)]
pub struct ReadyConnector {
    bridge: Arc<dyn HostBridge>,
}

impl ReadyConnector {
    pub fn new(bridge: Arc<dyn HostBridge>) -> Self {
        Self { bridge }
    }
}

#[async_trait::async_trait]
impl HostConnector for ReadyConnector {
    async fn connect(&self) -> Result<Arc<dyn HostBridge>, BridgeError> {
        Ok(Arc::clone(&self.bridge))
    }
}
