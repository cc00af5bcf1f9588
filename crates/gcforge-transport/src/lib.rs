//! Transport abstraction layer for gcforge.
//!
//! A session never speaks the platform protocol itself. It talks to a
//! *platform client* through the [`Transport`] trait: it sends
//! [`ClientCommand`]s and receives [`ClientEvent`]s. Two implementations
//! ship here:
//!
//! - [`ChannelTransport`]: an in-process pair of channels. Embedders
//!   that run a platform client in the same process use it, and so do
//!   the session tests.
//! - `BridgeTransport`: exchanges codec-encoded events and commands with
//!   a protocol bridge over WebSocket.
//!
//! # Feature Flags
//!
//! - `websocket` (default): `BridgeTransport` via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod channel;
mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use channel::{ChannelPeer, ChannelTransport};
pub use error::TransportError;
pub use gcforge_protocol::{ClientCommand, ClientEvent};
#[cfg(feature = "websocket")]
pub use websocket::BridgeTransport;

/// The command/event capability a session drives.
///
/// One transport belongs to exactly one session, so both methods take
/// `&mut self` and nothing here needs to be `Sync`.
pub trait Transport: Send + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hands a command to the platform client.
    async fn send(&mut self, command: ClientCommand) -> Result<(), Self::Error>;

    /// Waits for the next event from the platform client.
    ///
    /// Returns `Ok(None)` once the event feed has ended for good.
    ///
    /// Implementations must be cancel-safe: the session polls this inside
    /// `tokio::select!` next to its timers, and a dropped `recv` future
    /// must not lose an event.
    async fn recv(&mut self) -> Result<Option<ClientEvent>, Self::Error>;

    /// Releases the transport. The default does nothing.
    async fn close(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
