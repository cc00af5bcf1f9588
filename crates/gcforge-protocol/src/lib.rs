//! Client protocol vocabulary for gcforge.
//!
//! This crate defines everything that crosses the boundary between a
//! gcforge session and the platform client that actually speaks the
//! network protocol:
//!
//! - **Types** ([`SteamId`], [`EResult`], [`SentryHash`], …): identities
//!   and result codes reported by the platform.
//! - **Events** ([`ClientEvent`]): what the platform client tells us
//!   happened (connected, logged on, coordinator message arrived, …).
//! - **Commands** ([`ClientCommand`]): what we ask the platform client
//!   to do (connect, log on, send a coordinator message, …).
//! - **Coordinator payloads** ([`gc`]): the bodies of the handful of
//!   game-coordinator messages a session exchanges.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads and
//!   bridge frames are turned into bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (events/commands) → Protocol (this crate) → Session (state machine)
//! ```
//!
//! The protocol layer never parses platform wire bytes; that is the job
//! of the bridge behind the transport.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod command;
mod error;
mod event;
pub mod gc;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::{ClientCommand, LogOnDetails, MachineAuthResponse};
pub use error::ProtocolError;
pub use event::{ClientEvent, MachineAuthUpdate};
pub use gc::GcMessage;
pub use types::{EResult, JobId, PersonaState, SentryHash, SteamId};
