use gcforge_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The other end of the transport went away.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Reaching the bridge failed.
    #[error("connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    /// Sending a command failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving an event failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame could not be encoded or decoded.
    #[error("bridge frame: {0}")]
    Frame(#[from] ProtocolError),
}
