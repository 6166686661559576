//! In-memory host used for local previews and tests.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::host::{BridgeError, HostBridge, RenderSurface};

#[derive(Debug, Default)]
struct MemoryHostState {
    value: Option<String>,
    params: Value,
    staging_environment: Option<String>,
    body_height: u32,
    read_failure: Option<String>,
    auto_resizer_started: bool,
    reported_heights: Vec<u32>,
    writes: Vec<Option<String>>,
}

/// A host whose field, parameters and frame live in process memory.
///
/// Every call the extension makes is recorded so callers can inspect what
/// would have been sent to a real editor.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryHostState>,
}

impl MemoryHost {
    /// Create a host exposing `params` as its instance parameter bag.
    pub fn new(params: Value) -> Self {
        Self {
            state: Mutex::new(MemoryHostState {
                params,
                ..Default::default()
            }),
        }
    }

    pub fn with_value(self, value: Option<String>) -> Self {
        self.lock().value = value;
        self
    }

    pub fn with_staging_environment(self, staging_environment: Option<String>) -> Self {
        self.lock().staging_environment = staging_environment;
        self
    }

    pub fn with_body_height(self, height: u32) -> Self {
        self.lock().body_height = height;
        self
    }

    /// Make every field read fail with `message`.
    pub fn with_read_failure(self, message: impl Into<String>) -> Self {
        self.lock().read_failure = Some(message.into());
        self
    }

    /// Current field value.
    pub fn value(&self) -> Option<String> {
        self.lock().value.clone()
    }

    /// Change the rendered body height seen by the next height check.
    pub fn set_body_height(&self, height: u32) {
        self.lock().body_height = height;
    }

    /// Heights reported through [`HostBridge::set_height`], oldest first.
    pub fn reported_heights(&self) -> Vec<u32> {
        self.lock().reported_heights.clone()
    }

    /// Field writes, oldest first.
    pub fn writes(&self) -> Vec<Option<String>> {
        self.lock().writes.clone()
    }

    pub fn auto_resizer_started(&self) -> bool {
        self.lock().auto_resizer_started
    }

    fn lock(&self) -> MutexGuard<'_, MemoryHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl HostBridge for MemoryHost {
    async fn get_value(&self) -> Result<Option<String>, BridgeError> {
        let state = self.lock();
        match state.read_failure.as_ref() {
            Some(message) => Err(BridgeError::Call(message.clone())),
            None => Ok(state.value.clone()),
        }
    }

    fn set_value(&self, value: Option<&str>) -> Result<(), BridgeError> {
        let mut state = self.lock();
        let value = value.map(str::to_string);
        state.writes.push(value.clone());
        state.value = value;
        Ok(())
    }

    fn instance_params(&self) -> Value {
        self.lock().params.clone()
    }

    fn staging_environment(&self) -> Option<String> {
        self.lock().staging_environment.clone()
    }

    fn start_auto_resizer(&self) {
        self.lock().auto_resizer_started = true;
    }

    fn set_height(&self, height: u32) {
        self.lock().reported_heights.push(height);
    }
}

impl RenderSurface for MemoryHost {
    fn body_height(&self) -> u32 {
        self.lock().body_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn records_writes_and_reads_back_value() {
        let host = MemoryHost::new(json!({ "contentID": "abc" })).with_value(Some("#00aaff".into()));
        assert_eq!(host.get_value().await, Ok(Some("#00aaff".to_string())));

        host.set_value(Some("Sky")).expect("write value");
        host.set_value(None).expect("clear value");
        assert_eq!(host.value(), None);
        assert_eq!(host.writes(), vec![Some("Sky".to_string()), None]);
    }

    #[tokio::test]
    async fn scripted_read_failure_surfaces_message() {
        let host = MemoryHost::default().with_read_failure("host went away");
        let error = host.get_value().await.expect_err("read should fail");
        assert_eq!(error.to_string(), "host went away");
    }
}
