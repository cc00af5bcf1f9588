//! Unified error type for gcforge.

use std::path::PathBuf;

use gcforge_protocol::ProtocolError;
use gcforge_session::{SentryError, SessionError, StepUpError};
use gcforge_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// Running a session never fails (it ends in an `Outcome`); these are
/// the errors of setting one up: reading the config, reaching the
/// bridge, assembling the pieces.
#[derive(Debug, thiserror::Error)]
pub enum GcforgeError {
    /// A transport-level error (bridge connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unexpected message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A step-up code was refused.
    #[error(transparent)]
    StepUp(#[from] StepUpError),

    /// The device-authorization file could not be used.
    #[error(transparent)]
    Sentry(#[from] SentryError),

    /// The configuration file is not valid JSON or misses fields.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The builder was asked to build without a required piece.
    #[error("session builder is missing {0}")]
    Incomplete(&'static str),
}
