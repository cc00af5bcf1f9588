//! In-process transport built from two unbounded `mpsc` channels.

use tokio::sync::mpsc;

use crate::{ClientCommand, ClientEvent, Transport, TransportError};

/// The session's end of an in-process transport.
pub struct ChannelTransport {
    events: mpsc::UnboundedReceiver<ClientEvent>,
    commands: mpsc::UnboundedSender<ClientCommand>,
}

/// The platform client's end: feeds events in, takes commands out.
pub struct ChannelPeer {
    events: mpsc::UnboundedSender<ClientEvent>,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
}

impl ChannelTransport {
    /// Creates a connected transport/peer pair.
    pub fn pair() -> (Self, ChannelPeer) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        (
            Self {
                events: event_rx,
                commands: command_tx,
            },
            ChannelPeer {
                events: event_tx,
                commands: command_rx,
            },
        )
    }
}

impl Transport for ChannelTransport {
    type Error = TransportError;

    async fn send(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        self.commands.send(command).map_err(|_| {
            TransportError::ConnectionClosed("platform client dropped".into())
        })
    }

    async fn recv(&mut self) -> Result<Option<ClientEvent>, Self::Error> {
        // `UnboundedReceiver::recv` is cancel-safe.
        Ok(self.events.recv().await)
    }
}

impl ChannelPeer {
    /// Delivers an event to the session.
    ///
    /// Returns `false` if the session side has been dropped.
    pub fn emit(&self, event: ClientEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Waits for the next command from the session.
    ///
    /// Returns `None` once the session side has been dropped.
    pub async fn next_command(&mut self) -> Option<ClientCommand> {
        self.commands.recv().await
    }

    /// Returns a command if one is already queued.
    pub fn try_next_command(&mut self) -> Option<ClientCommand> {
        self.commands.try_recv().ok()
    }
}
