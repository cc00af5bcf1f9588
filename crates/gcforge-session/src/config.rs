//! Session configuration: who logs on, what they do, and how patient to be.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use gcforge_protocol::gc::DEFAULT_APP_ID;
use serde::{Deserialize, Serialize};

use crate::WorkflowRequest;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing and retry knobs for a session.
///
/// Every field has a default, so a config file only needs to name the
/// ones it changes (`#[serde(default)]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Connection failures tolerated before the session gives up.
    ///
    /// Default: 5.
    pub max_reconnects: u32,

    /// Pause before reconnecting after a failure or a dropped link.
    ///
    /// Default: 5 seconds.
    pub reconnect_backoff_secs: u64,

    /// Pause between receiving a step-up code and the next logon, so the
    /// platform is ready for it.
    ///
    /// Default: 5 seconds.
    pub step_up_settle_secs: u64,

    /// Pause between announcing the app as "in use" and saying hello to
    /// its coordinator.
    ///
    /// Default: 5 seconds.
    pub hello_delay_secs: u64,

    /// Longest the event loop sleeps before re-checking whether it has
    /// been asked to stop.
    ///
    /// Default: 1 second.
    pub poll_interval_secs: u64,

    /// How long a ban lookup may take before it counts as "no info".
    ///
    /// Default: 10 seconds.
    pub reputation_timeout_secs: u64,

    /// Give up waiting for a step-up code after this long. `None` waits
    /// forever.
    ///
    /// Default: `None`.
    pub step_up_timeout_secs: Option<u64>,

    /// The application whose coordinator runs the workflow.
    ///
    /// Default: 730.
    pub app_id: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_reconnects: 5,
            reconnect_backoff_secs: 5,
            step_up_settle_secs: 5,
            hello_delay_secs: 5,
            poll_interval_secs: 1,
            reputation_timeout_secs: 10,
            step_up_timeout_secs: None,
            app_id: DEFAULT_APP_ID,
        }
    }
}

impl SessionConfig {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }

    pub fn step_up_settle(&self) -> Duration {
        Duration::from_secs(self.step_up_settle_secs)
    }

    pub fn hello_delay(&self) -> Duration {
        Duration::from_secs(self.hello_delay_secs)
    }

    /// Never zero: a zero poll interval would spin the loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn reputation_timeout(&self) -> Duration {
        Duration::from_secs(self.reputation_timeout_secs)
    }

    pub fn step_up_timeout(&self) -> Option<Duration> {
        self.step_up_timeout_secs.map(Duration::from_secs)
    }
}

// ---------------------------------------------------------------------------
// AccountCredentials
// ---------------------------------------------------------------------------

/// Username and password for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCredentials {
    pub username: String,
    pub password: String,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SessionOptions
// ---------------------------------------------------------------------------

/// Everything a session is constructed from, apart from its collaborators.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub credentials: AccountCredentials,
    pub workflow: WorkflowRequest,
    /// Where this account's device-authorization file lives.
    pub sentry_path: PathBuf,
    pub config: SessionConfig,
}
