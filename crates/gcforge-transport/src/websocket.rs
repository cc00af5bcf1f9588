//! WebSocket bridge transport using `tokio-tungstenite`.
//!
//! A protocol bridge is a separate process that implements the real
//! platform protocol and exposes it as a stream of [`ClientEvent`] frames
//! going one way and [`ClientCommand`] frames going the other. Each
//! WebSocket message carries exactly one codec-encoded frame.

use futures_util::{SinkExt, StreamExt};
use gcforge_protocol::{Codec, JsonCodec};
use tokio_tungstenite::tungstenite::Message;

use crate::{ClientCommand, ClientEvent, Transport, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// A [`Transport`] backed by a WebSocket connection to a protocol bridge.
pub struct BridgeTransport<C: Codec = JsonCodec> {
    ws: WsStream,
    codec: C,
}

impl BridgeTransport<JsonCodec> {
    /// Connects to the bridge at `url` (e.g. `ws://127.0.0.1:27080`) and
    /// exchanges JSON frames.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        Self::connect_with_codec(url, JsonCodec).await
    }
}

impl<C: Codec> BridgeTransport<C> {
    /// Connects to the bridge at `url` using `codec` for frames.
    pub async fn connect_with_codec(
        url: &str,
        codec: C,
    ) -> Result<Self, TransportError> {
        let (ws, _response) =
            tokio_tungstenite::connect_async(url).await.map_err(|e| {
                TransportError::ConnectFailed(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        tracing::info!(url, "connected to protocol bridge");
        Ok(Self { ws, codec })
    }
}

impl<C: Codec> Transport for BridgeTransport<C> {
    type Error = TransportError;

    async fn send(&mut self, command: ClientCommand) -> Result<(), Self::Error> {
        let frame = self.codec.encode(&command)?;
        tracing::trace!(command = command.kind(), bytes = frame.len(), "bridge send");
        self.ws
            .send(Message::Binary(frame.into()))
            .await
            .map_err(|e| {
                TransportError::SendFailed(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    e,
                ))
            })
    }

    async fn recv(&mut self) -> Result<Option<ClientEvent>, Self::Error> {
        loop {
            let data: Vec<u8> = match self.ws.next().await {
                Some(Ok(Message::Binary(data))) => data.into(),
                Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            };
            let event: ClientEvent = self.codec.decode(&data)?;
            tracing::trace!(event = event.kind(), "bridge recv");
            return Ok(Some(event));
        }
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.ws.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
