//! Transport to the realtime model.
//!
//! [`LiveConnector`] opens a session and completes the setup handshake; [`LiveTransport`]
//! moves frames afterwards. [`WsConnector`] is the websocket implementation.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{VoiceError, VoiceResult};
use crate::protocol::{ClientMessage, Inbound, ServerMessage, Setup};

const SETUP_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait LiveTransport: Send {
    /// Send-and-forget; no per-frame acknowledgement.
    async fn send(&mut self, message: ClientMessage) -> VoiceResult<()>;

    /// Next inbound frame. `None` once the remote closed the session. Must be cancel-safe.
    async fn recv(&mut self) -> Option<VoiceResult<ServerMessage>>;

    async fn close(&mut self);
}

#[async_trait]
pub trait LiveConnector: Send + Sync {
    /// Opens a session and returns once the remote acknowledged `setup`.
    async fn connect(&self, setup: Setup) -> VoiceResult<Box<dyn LiveTransport>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Websocket endpoint of the realtime model, authenticated with an API key query parameter.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    api_key: String,
}

impl WsConnector {
    pub fn new(url: &str, api_key: &str) -> Self {
        Self {
            url: url.to_string(),
            api_key: api_key.trim().to_string(),
        }
    }

    fn endpoint(&self) -> String {
        if self.api_key.is_empty() {
            return self.url.clone();
        }
        let sep = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}key={}", self.url, sep, self.api_key)
    }
}

#[async_trait]
impl LiveConnector for WsConnector {
    async fn connect(&self, setup: Setup) -> VoiceResult<Box<dyn LiveTransport>> {
        info!(model = %setup.model, "🌐 Opening live session");
        let (ws, _) = connect_async(self.endpoint()).await?;
        let mut transport = WsTransport { ws };
        transport.send(ClientMessage::Setup(setup)).await?;

        let handshake = async {
            loop {
                match transport.recv().await {
                    Some(Ok(msg)) => {
                        if msg.into_events().contains(&Inbound::SetupComplete) {
                            return Ok(());
                        }
                    }
                    Some(Err(e)) => return Err(e),
                    None => return Err(VoiceError::Remote("session closed during setup".to_string())),
                }
            }
        };
        let outcome = tokio::time::timeout(SETUP_TIMEOUT, handshake).await;
        match outcome {
            Ok(Ok(())) => {
                info!("✅ Live session ready");
                Ok(Box::new(transport))
            }
            Ok(Err(e)) => {
                transport.close().await;
                Err(e)
            }
            Err(_) => {
                transport.close().await;
                Err(VoiceError::Remote("setup was not acknowledged in time".to_string()))
            }
        }
    }
}

pub struct WsTransport {
    ws: WsStream,
}

#[async_trait]
impl LiveTransport for WsTransport {
    async fn send(&mut self, message: ClientMessage) -> VoiceResult<()> {
        let text = message.to_json()?;
        self.ws.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<VoiceResult<ServerMessage>> {
        loop {
            let frame = match self.ws.next().await? {
                Ok(frame) => frame,
                Err(e) => return Some(Err(e.into())),
            };
            match frame {
                Message::Text(text) => return Some(ServerMessage::parse(&text)),
                Message::Binary(bytes) => return Some(ServerMessage::parse_bytes(&bytes)),
                Message::Close(reason) => {
                    debug!(?reason, "remote closed live session");
                    return None;
                }
                // tungstenite answers pings on the next write
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            warn!("live session close: {}", e);
        }
    }
}
