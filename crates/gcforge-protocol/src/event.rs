//! Inbound events: what the platform client reports back to a session.

use serde::{Deserialize, Serialize};

use crate::{EResult, GcMessage, JobId, SteamId};

/// An event delivered by the platform client.
///
/// The session consumes these one at a time, in order. It never sees raw
/// wire bytes; the transport (or the bridge behind it) has already
/// turned the platform's callbacks into these variants.
///
/// Internally tagged for the bridge: `{ "type": "Connected", "result": "Ok" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// A connection attempt finished. `result` is `Ok` when the link is up.
    Connected { result: EResult },

    /// The link to the platform went down.
    ///
    /// `user_initiated` is `true` when we asked for the disconnect.
    Disconnected {
        #[serde(default)]
        user_initiated: bool,
    },

    /// The platform answered a logon request.
    LoggedOn {
        result: EResult,
        #[serde(default)]
        extended_result: EResult,
        /// For [`EResult::AccountLogonDenied`]: the domain the emailed
        /// code was sent to. Display only.
        #[serde(default)]
        email_domain: Option<String>,
        /// The identity of the logged-on account (present on success).
        #[serde(default)]
        steam_id: Option<SteamId>,
    },

    /// The platform ended our logon session.
    LoggedOff { result: EResult },

    /// The platform wants us to write (part of) the device-authorization
    /// file and report back its new hash.
    MachineAuthUpdate(MachineAuthUpdate),

    /// A game-coordinator message for `app_id` arrived.
    GcMessage { app_id: u32, message: GcMessage },
}

impl ClientEvent {
    /// Short name of the variant, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "Connected",
            Self::Disconnected { .. } => "Disconnected",
            Self::LoggedOn { .. } => "LoggedOn",
            Self::LoggedOff { .. } => "LoggedOff",
            Self::MachineAuthUpdate(_) => "MachineAuthUpdate",
            Self::GcMessage { .. } => "GcMessage",
        }
    }
}

/// A request to write a chunk of the device-authorization file.
///
/// Large sentry blobs may be split across several updates with different
/// offsets; each update overwrites `bytes_to_write` bytes at `offset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineAuthUpdate {
    pub job_id: JobId,
    pub file_name: String,
    pub offset: u64,
    pub bytes_to_write: usize,
    pub data: Vec<u8>,
    #[serde(default)]
    pub one_time_password: Option<String>,
}
