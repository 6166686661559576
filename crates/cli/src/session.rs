//! Session files describing the host side of a preview.
//!
//! A session stands in for the editor: it holds the stored field value, the
//! instance parameters and the staging host. The default location is
//! `~/.config/brand-color/session.json` on most platforms.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use brand_color_engine::MemoryHost;
use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Environment variable allowing callers to override the session file path.
pub const SESSION_PATH_ENV: &str = "BRAND_COLOR_SESSION_PATH";

/// Default filename for the JSON payload.
pub const SESSION_FILE_NAME: &str = "session.json";

/// Error surfaced when reading or writing a session fails.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session file at {}", .0.display())]
    NotFound(PathBuf),
    #[error("session I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted host state for one preview session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    /// Value currently stored in the field.
    #[serde(default)]
    pub value: Option<String>,
    /// Instance parameters as the host would send them.
    #[serde(default)]
    pub params: Value,
    /// Staging environment host, when previewing unpublished content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_environment: Option<String>,
    /// Rendered body height reported to the host.
    #[serde(default)]
    pub body_height: u32,
}

impl SessionFile {
    /// Build an in-memory host seeded from this session.
    pub fn to_host(&self) -> MemoryHost {
        MemoryHost::new(self.params.clone())
            .with_value(self.value.clone())
            .with_staging_environment(self.staging_environment.clone())
            .with_body_height(self.body_height)
    }
}

/// Resolve the session path: explicit argument, then `BRAND_COLOR_SESSION_PATH`,
/// then the platform config directory.
pub fn resolve_session_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return expand_tilde(&path.to_string_lossy());
    }
    if let Ok(path) = env::var(SESSION_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("brand-color")
        .join(SESSION_FILE_NAME)
}

pub fn load_session(path: &Path) -> Result<SessionFile, SessionError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Err(SessionError::NotFound(path.to_path_buf())),
        Err(error) => Err(SessionError::Io(error)),
    }
}

pub fn save_session(session: &SessionFile, path: &Path) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(session)?;
    fs::write(path, content)?;
    Ok(())
}

fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    if trimmed == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = trimmed.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_color_engine::{HostBridge, RenderSurface};
    use serde_json::json;

    #[test]
    fn default_path_honors_environment_override() {
        let override_path = "~/custom/brand-color/session.json";
        temp_env::with_var(SESSION_PATH_ENV, Some(override_path), || {
            let path = resolve_session_path(None);
            assert_eq!(path, expand_tilde(override_path));
        });
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        temp_env::with_var(SESSION_PATH_ENV, Some("/tmp/ignored.json"), || {
            let path = resolve_session_path(Some(Path::new("/srv/session.json")));
            assert_eq!(path, PathBuf::from("/srv/session.json"));
        });
    }

    #[test]
    fn missing_session_is_reported_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let error = load_session(&path).expect_err("file does not exist");
        assert!(matches!(error, SessionError::NotFound(ref missing) if missing == &path));
    }

    #[test]
    fn session_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join(SESSION_FILE_NAME);
        let session = SessionFile {
            value: Some("Sky".into()),
            params: json!({ "contentID": "palette-1", "useNames": true }),
            staging_environment: None,
            body_height: 320,
        };
        save_session(&session, &path).expect("save session");

        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("\"bodyHeight\": 320"));
        assert_eq!(load_session(&path).expect("load session"), session);
    }

    #[tokio::test]
    async fn host_is_seeded_from_session() {
        let session: SessionFile = serde_json::from_value(json!({
            "value": "#00aaff",
            "params": { "contentID": "palette-1" },
            "stagingEnvironment": "abc.staging.bigcontent.io",
            "bodyHeight": 180
        }))
        .expect("deserialize session");
        let host = session.to_host();
        assert_eq!(host.get_value().await, Ok(Some("#00aaff".to_string())));
        assert_eq!(host.staging_environment().as_deref(), Some("abc.staging.bigcontent.io"));
        assert_eq!(host.body_height(), 180);
        assert_eq!(host.instance_params()["contentID"], "palette-1");
    }
}
