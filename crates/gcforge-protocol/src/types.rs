//! Identity and result types reported by the platform.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A 64-bit platform account identity.
///
/// Newtype over `u64` so an account identity can never be confused with a
/// match id or an app id. Serialized transparently as the plain number.
///
/// The low 32 bits are the *account id*, which is what coordinator
/// payloads carry (see [`SteamId::account_id`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteamId(pub u64);

impl SteamId {
    /// The 32-bit account id embedded in the low half of the identity.
    pub fn account_id(self) -> u32 {
        (self.0 & 0xFFFF_FFFF) as u32
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Correlates a platform request with our response to it.
///
/// Machine-auth updates carry one; the response must echo it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EResult
// ---------------------------------------------------------------------------

/// Result codes the platform attaches to connect, logon and logoff events.
///
/// Only the codes the session reacts to are named. Anything else arrives
/// as [`EResult::Other`] carrying the raw platform code, and is treated
/// as a generic failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EResult {
    #[default]
    Ok,
    Fail,
    NoConnection,
    InvalidPassword,
    LoggedInElsewhere,
    Timeout,
    Banned,
    ServiceUnavailable,
    AccountLogonDenied,
    AlreadyLoggedInElsewhere,
    RateLimitExceeded,
    AccountLoginDeniedNeedTwoFactor,
    TwoFactorCodeMismatch,
    InvalidLoginAuthCode,
    Other(i32),
}

impl EResult {
    /// `true` only for [`EResult::Ok`].
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    /// `true` for the two logoff reasons that mean another client took
    /// over this account.
    pub fn is_concurrent_session(self) -> bool {
        matches!(self, Self::LoggedInElsewhere | Self::AlreadyLoggedInElsewhere)
    }
}

impl fmt::Display for EResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Other({code})"),
            named => write!(f, "{named:?}"),
        }
    }
}

// ---------------------------------------------------------------------------
// PersonaState
// ---------------------------------------------------------------------------

/// The presence a logged-on account shows to its friends list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonaState {
    Offline,
    Online,
}

// ---------------------------------------------------------------------------
// SentryHash
// ---------------------------------------------------------------------------

/// SHA-1 digest of a device-authorization ("sentry") file.
///
/// Presented on logon to prove this device was approved before, and
/// returned after every machine-auth write. Displays as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SentryHash(pub [u8; 20]);

impl SentryHash {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for SentryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for SentryHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SentryHash({self})")
    }
}
