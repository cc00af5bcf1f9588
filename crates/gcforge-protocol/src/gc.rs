//! Game-coordinator messages.
//!
//! The game coordinator is an application-level protocol that runs on
//! top of a logged-on platform session. Every coordinator message is a
//! numeric message type plus an opaque body; this module names the few
//! types a gcforge session exchanges and gives their bodies a shape.
//!
//! Bodies are encoded with the session's [`Codec`]. The bridge behind
//! the transport re-encodes them into the coordinator's own format.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Codec, ProtocolError, SteamId};

/// The application whose coordinator gcforge talks to by default.
pub const DEFAULT_APP_ID: u32 = 730;

/// Coordinator message type identifiers.
pub mod msg_type {
    /// Client → coordinator: "I am here, start a coordinator session."
    pub const CLIENT_HELLO: u32 = 4006;
    /// Coordinator → client: "Session established."
    pub const CLIENT_WELCOME: u32 = 4004;
    /// Client → coordinator: report a player.
    pub const CLIENT_REPORT_PLAYER: u32 = 9112;
    /// Client → coordinator: commend a player.
    pub const CLIENT_COMMEND_PLAYER: u32 = 9113;
    /// Coordinator → client: commendation accepted.
    pub const CLIENT_COMMEND_PLAYER_QUERY_RESPONSE: u32 = 9116;
    /// Coordinator → client: report accepted.
    pub const CLIENT_REPORT_RESPONSE: u32 = 9131;
}

// ---------------------------------------------------------------------------
// GcMessage
// ---------------------------------------------------------------------------

/// One coordinator message: a type identifier and an encoded body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GcMessage {
    pub msg_type: u32,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl GcMessage {
    /// Encodes `body` with `codec` into a message of type `msg_type`.
    pub fn encode<C: Codec, T: Serialize>(
        codec: &C,
        msg_type: u32,
        body: &T,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            msg_type,
            body: codec.encode(body)?,
        })
    }

    /// Decodes the body as `T`, checking the message type first.
    ///
    /// # Errors
    /// [`ProtocolError::UnexpectedMessageType`] if `msg_type` differs from
    /// `expected`, or the codec's decode error if the body is malformed.
    pub fn decode<C: Codec, T: DeserializeOwned>(
        &self,
        codec: &C,
        expected: u32,
    ) -> Result<T, ProtocolError> {
        if self.msg_type != expected {
            return Err(ProtocolError::UnexpectedMessageType {
                expected,
                actual: self.msg_type,
            });
        }
        codec.decode(&self.body)
    }
}

// ---------------------------------------------------------------------------
// Handshake bodies
// ---------------------------------------------------------------------------

/// Body of [`msg_type::CLIENT_HELLO`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientHello {
    pub version: u32,
}

/// Body of [`msg_type::CLIENT_WELCOME`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientWelcome {
    pub version: u32,
}

// ---------------------------------------------------------------------------
// Workflow bodies
// ---------------------------------------------------------------------------

/// Body of [`msg_type::CLIENT_REPORT_PLAYER`].
///
/// Each `rpt_*` field is a category flag (0 or 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportPlayer {
    pub account_id: u32,
    pub match_id: u64,
    pub rpt_aimbot: u32,
    pub rpt_wallhack: u32,
    pub rpt_speedhack: u32,
    pub rpt_teamharm: u32,
    pub rpt_textabuse: u32,
    pub rpt_voiceabuse: u32,
}

impl ReportPlayer {
    /// A report against `target` in `match_id` with every category set.
    pub fn all_categories(target: SteamId, match_id: u64) -> Self {
        Self {
            account_id: target.account_id(),
            match_id,
            rpt_aimbot: 1,
            rpt_wallhack: 1,
            rpt_speedhack: 1,
            rpt_teamharm: 1,
            rpt_textabuse: 1,
            rpt_voiceabuse: 1,
        }
    }
}

/// Body of [`msg_type::CLIENT_REPORT_RESPONSE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportResponse {
    pub confirmation_id: u64,
    pub account_id: u32,
    pub response_type: u32,
    pub response_result: u32,
    pub tokens: u32,
}

/// The commendation categories, each a flag (0 or 1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCommendation {
    pub cmd_friendly: u32,
    pub cmd_teaching: u32,
    pub cmd_leader: u32,
}

/// Body of [`msg_type::CLIENT_COMMEND_PLAYER`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommendPlayer {
    pub account_id: u32,
    pub match_id: u64,
    pub commendation: PlayerCommendation,
    pub tokens: u32,
}

impl CommendPlayer {
    /// A commendation of `target` with every category set.
    pub fn all_categories(target: SteamId) -> Self {
        Self {
            account_id: target.account_id(),
            match_id: 0,
            commendation: PlayerCommendation {
                cmd_friendly: 1,
                cmd_teaching: 1,
                cmd_leader: 1,
            },
            tokens: 0,
        }
    }
}

/// Body of [`msg_type::CLIENT_COMMEND_PLAYER_QUERY_RESPONSE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommendResponse {
    pub account_id: u32,
    pub commendation: PlayerCommendation,
    pub tokens: u32,
}
