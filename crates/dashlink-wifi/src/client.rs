//! Receiver-side WebSocket client
//!
//! Dials `ws://<ip>:<port>` with a bounded handshake, then forwards every
//! decodable JSON text frame to the session until the socket closes. One
//! corrupt frame never ends the read loop.

use std::net::IpAddr;

use dashlink_core::{codec, Result, SensorSample, SharedSession};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::config::WifiLinkConfig;
use crate::error::WifiLinkError;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// The live client connection to a sender's listener
pub(crate) struct WsClient {
    writer: WsSink,
    read_task: JoinHandle<()>,
}

impl WsClient {
    /// Dial the sender. The handshake is bounded by the configured timeout;
    /// the caller announces the state change once this returns.
    pub(crate) async fn connect(
        ip: IpAddr,
        config: &WifiLinkConfig,
        session: SharedSession,
    ) -> Result<Self> {
        let url = format!("ws://{ip}:{}", config.port);
        info!(%url, "connecting to sensor server");

        let (stream, _) = timeout(config.connect_timeout, connect_async(&url))
            .await
            .map_err(|_| WifiLinkError::ConnectTimeout(url.clone(), config.connect_timeout))?
            .map_err(|e| WifiLinkError::Connect {
                peer: url.clone(),
                reason: e.to_string(),
            })?;

        let (writer, mut reader) = stream.split();

        let read_task = tokio::spawn(async move {
            while let Some(message) = reader.next().await {
                match message {
                    Ok(Message::Text(text)) => match codec::decode_frame(&text) {
                        Some(sample) => {
                            session.lock().unwrap().deliver(sample);
                        }
                        None => session.lock().unwrap().note_dropped(),
                    },
                    Ok(Message::Close(_)) => {
                        debug!("server closed the socket");
                        break;
                    }
                    Ok(Message::Binary(_)) => session.lock().unwrap().note_dropped(),
                    Ok(_) => {}
                    Err(e) => {
                        debug!("socket error: {e}");
                        break;
                    }
                }
            }
            // fires (false, None) once; a no-op if disconnect() got there first
            session.lock().unwrap().mark_disconnected();
        });

        Ok(Self { writer, read_task })
    }

    /// Best-effort frame write; the caller checks readiness first
    pub(crate) async fn send(&mut self, sample: &SensorSample) -> Result<()> {
        let frame = codec::encode_frame(sample)?;
        self.writer
            .send(Message::Text(frame))
            .await
            .map_err(|e| WifiLinkError::Write(e.to_string()))?;
        Ok(())
    }

    /// Close the socket and stop the read loop
    pub(crate) async fn close(mut self) {
        let _ = self.writer.close().await;
        self.read_task.abort();
    }
}
