//! Outbound commands: what a session asks the platform client to do.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EResult, GcMessage, JobId, PersonaState, SentryHash};

/// A command for the platform client.
///
/// This is the whole outbound capability a session has. Internally tagged
/// for the bridge: `{ "type": "SetPersona", "state": "Online" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    /// Start a connection attempt. Answered by `Connected`/`Disconnected`.
    Connect,

    /// Tear the link down. Answered by `Disconnected`.
    Disconnect,

    /// Change the presence shown to friends.
    SetPersona { state: PersonaState },

    /// Log on with the given details. Answered by `LoggedOn`.
    LogOn(LogOnDetails),

    /// End the logon session without dropping the link.
    LogOff,

    /// Declare which applications this account is currently "in use" of.
    /// The coordinator for an app only talks to accounts playing it.
    GamesPlayed { app_ids: Vec<u32> },

    /// Send a game-coordinator message to `app_id`'s coordinator.
    SendGc { app_id: u32, message: GcMessage },

    /// Answer a `MachineAuthUpdate`.
    RespondMachineAuth(MachineAuthResponse),
}

impl ClientCommand {
    /// Short name of the variant, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect => "Connect",
            Self::Disconnect => "Disconnect",
            Self::SetPersona { .. } => "SetPersona",
            Self::LogOn(_) => "LogOn",
            Self::LogOff => "LogOff",
            Self::GamesPlayed { .. } => "GamesPlayed",
            Self::SendGc { .. } => "SendGc",
            Self::RespondMachineAuth(_) => "RespondMachineAuth",
        }
    }
}

/// Everything the platform needs for a logon attempt.
///
/// `auth_code` is the emailed code, `two_factor_code` the authenticator
/// app code. Either is only present on the attempt right after the
/// platform asked for it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogOnDetails {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub auth_code: Option<String>,
    #[serde(default)]
    pub two_factor_code: Option<String>,
    #[serde(default)]
    pub sentry_hash: Option<SentryHash>,
}

/// Hand-written so passwords never end up in logs.
impl fmt::Debug for LogOnDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogOnDetails")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_code", &self.auth_code)
            .field("two_factor_code", &self.two_factor_code)
            .field("sentry_hash", &self.sentry_hash)
            .finish()
    }
}

/// Our answer to a machine-auth update.
///
/// Echoes the request's job id, file name, offset and one-time password,
/// and reports the resulting file size and whole-file hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineAuthResponse {
    pub job_id: JobId,
    pub file_name: String,
    pub bytes_written: usize,
    pub file_size: u64,
    pub offset: u64,
    pub result: EResult,
    pub last_error: i32,
    pub one_time_password: Option<String>,
    pub sentry_hash: Option<SentryHash>,
}
