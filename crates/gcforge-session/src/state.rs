//! The session lifecycle state.

use std::fmt;

/// Where a session is in its lifecycle.
///
/// ```text
///                 ┌──────────── Disconnected ◄────────┐ (backoff)
///                 ▼                                    │
///   start ──► Connecting ──► LoggingOn ──► Online ──► AwaitingHandshake
///                 ▲              │                          │ welcome
///                 │ settle       ▼                          ▼
///                 └──────── AwaitingStepUp      AwaitingWorkflowResponse
///                                                           │ response
///          (fatal results, logged in elsewhere, stop) ──► Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No link. Initial state, and the state while a reconnect backoff runs.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Waiting for a step-up code (or for the settle delay after one).
    AwaitingStepUp,
    /// Link is up, logon request sent.
    LoggingOn,
    /// Logged on, presence announced, hello not yet sent.
    Online,
    /// Hello sent, waiting for the coordinator's welcome.
    AwaitingHandshake,
    /// Workflow request sent, waiting for its response.
    AwaitingWorkflowResponse,
    /// Done. Nothing leaves this state.
    Terminated,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
