//! The configuration file.
//!
//! ```json
//! {
//!   "bridge_url": "ws://127.0.0.1:27080",
//!   "sentry_dir": "sentries",
//!   "account": { "username": "alice", "password": "hunter2" },
//!   "workflow": { "kind": "Report", "target": 76561197960287930, "match_id": 0 },
//!   "session": { "max_reconnects": 5, "step_up_timeout_secs": 600 }
//! }
//! ```
//!
//! `session` and every field inside it are optional.

use std::path::{Path, PathBuf};

use gcforge_session::{
    AccountCredentials, SentryStore, SessionConfig, SessionOptions, WorkflowRequest,
};
use serde::{Deserialize, Serialize};

use crate::GcforgeError;

/// Everything needed to run one session, as read from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcforgeConfig {
    /// WebSocket URL of the protocol bridge.
    pub bridge_url: String,
    /// Directory holding one `<username>.sentry` file per account.
    pub sentry_dir: PathBuf,
    pub account: AccountCredentials,
    pub workflow: WorkflowRequest,
    #[serde(default)]
    pub session: SessionConfig,
}

impl GcforgeConfig {
    /// Reads and parses a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GcforgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| GcforgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), account = %config.account.username, "config loaded");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, GcforgeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Where this account's device-authorization file lives.
    pub fn sentry_path(&self) -> PathBuf {
        SentryStore::for_account(&self.sentry_dir, &self.account.username)
            .path()
            .to_path_buf()
    }

    /// The session-construction options this file describes.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            credentials: self.account.clone(),
            workflow: self.workflow,
            sentry_path: self.sentry_path(),
            config: self.session.clone(),
        }
    }
}
