//! Error types for the session layer.
//!
//! [`SessionError`] is the failure taxonomy of a session. Most variants
//! never escape [`Session::run`](crate::Session::run): the state machine
//! logs them and turns them into a terminal [`Outcome`] via
//! [`SessionError::outcome`]. The two leaf enums, [`StepUpError`] and
//! [`SentryError`], are returned directly to the callers of the step-up
//! handle and the credential store.

use std::path::PathBuf;

use gcforge_protocol::{EResult, ProtocolError};

use crate::{BanInfo, Outcome, StepUpKind};

/// Everything that can go wrong while driving a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The transport refused a command or its event feed failed.
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The event feed ended while the session still needed it.
    #[error("event feed closed")]
    FeedClosed,

    /// A connection attempt was answered with a non-OK result.
    #[error("connect failed: {0}")]
    ConnectFailed(EResult),

    /// Logon was refused for a reason other than step-up or an outage.
    #[error("logon failed: {result} (extended: {extended})")]
    LogonFailed {
        /// The primary result code.
        result: EResult,
        /// The platform's extended result code.
        extended: EResult,
    },

    /// The platform wants an extra verification code. Recoverable: the
    /// session suspends until one is supplied.
    #[error("step-up code required: {0}")]
    StepUpRequired(StepUpKind),

    /// No step-up code arrived within the configured timeout.
    #[error("timed out waiting for {0}")]
    StepUpTimedOut(StepUpKind),

    /// The platform is down.
    #[error("platform service unavailable")]
    ServiceUnavailable,

    /// Another client logged on to this account.
    #[error("account logged in elsewhere ({0})")]
    DuplicateSession(EResult),

    /// The account has a ban on record. Recorded, not fatal.
    #[error(
        "account has a ban on record (vac: {}, game bans: {})",
        .0.vac_banned,
        .0.game_ban_count
    )]
    AccountBanned(BanInfo),

    /// Something tried to overwrite a terminal outcome.
    #[error("outcome already {current}, refusing {rejected}")]
    OutcomeAlreadySet {
        /// The outcome that stays.
        current: Outcome,
        /// The outcome that was refused.
        rejected: Outcome,
    },

    /// A coordinator payload could not be built or parsed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The device-authorization file could not be read or written.
    #[error(transparent)]
    Sentry(#[from] SentryError),
}

impl SessionError {
    /// The terminal outcome this error implies, if it ends the session.
    ///
    /// `None` for the recoverable members of the taxonomy (step-up
    /// requests, ban annotations, rejected outcome writes, sentry write
    /// failures).
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Self::Transport(_)
            | Self::FeedClosed
            | Self::ConnectFailed(_)
            | Self::LogonFailed { .. }
            | Self::StepUpTimedOut(_)
            | Self::Protocol(_) => Some(Outcome::Failure),
            Self::ServiceUnavailable => Some(Outcome::ServiceUnavailable),
            Self::DuplicateSession(_) => Some(Outcome::AlreadyLoggedInElsewhere),
            Self::AccountBanned(_) => Some(Outcome::AccountBanned),
            Self::StepUpRequired(_) | Self::OutcomeAlreadySet { .. } | Self::Sentry(_) => {
                None
            }
        }
    }
}

/// Errors returned to whoever supplies step-up codes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepUpError {
    /// Codes must contain at least one non-whitespace character.
    #[error("step-up code is empty")]
    EmptyCode,

    /// A code is already waiting to be picked up by the session.
    #[error("a step-up code is already pending delivery")]
    SlotFull,

    /// The session is gone; nobody will read the code.
    #[error("session closed")]
    SessionClosed,
}

/// Errors from the device-authorization ("sentry") store.
#[derive(Debug, thiserror::Error)]
pub enum SentryError {
    /// Reading, writing or hashing the file failed.
    #[error("sentry file {path}: {source}")]
    Io {
        /// The sentry file involved.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An update asked to write more bytes than it carried.
    #[error("update wants {requested} bytes but carries only {available}")]
    ShortData {
        /// `bytes_to_write` from the update.
        requested: usize,
        /// Length of the update's data.
        available: usize,
    },
}

impl SentryError {
    /// The raw OS error code, for the machine-auth response.
    pub fn os_error(&self) -> i32 {
        match self {
            Self::Io { source, .. } => source.raw_os_error().unwrap_or(-1),
            Self::ShortData { .. } => -1,
        }
    }
}
