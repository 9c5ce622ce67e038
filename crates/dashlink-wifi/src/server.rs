//! Sender-side WebSocket listener
//!
//! The sender binds the well-known sensor port and serves one receiver at a
//! time: a newer connection replaces the previous one, never stacking two.
//! Inbound frames are decoded and delivered symmetrically, so the same
//! listener works when the roles are reversed.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashlink_core::{codec, LinkError, LinkRole, Result, SensorSample, SharedSession};
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::WifiLinkError;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

// ----------------------------------------------------------------------------
// Server
// ----------------------------------------------------------------------------

/// The sender's listener and its single live client
pub(crate) struct WsServer {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
    client: Arc<Mutex<Option<WsSink>>>,
    session: SharedSession,
}

impl WsServer {
    /// Bind the listener and start accepting receivers
    pub(crate) async fn bind(addr: SocketAddr, session: SharedSession) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| WifiLinkError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        let local_addr = listener.local_addr().map_err(|e| WifiLinkError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        info!(%local_addr, "sensor server listening");

        let client = Arc::new(Mutex::new(None));
        // read loops outlive the clients they serve; only the loop of the
        // current generation may tear the link down
        let generation = Arc::new(AtomicU64::new(0));

        let accept_client = Arc::clone(&client);
        let accept_session = session.clone();
        let accept_task = tokio::spawn(async move {
            loop {
                let (stream, peer_addr) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        warn!("accept failed: {e}");
                        break;
                    }
                };
                let ws = match accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(e) => {
                        warn!(%peer_addr, "websocket handshake failed: {e}");
                        continue;
                    }
                };
                info!(%peer_addr, "receiver connected");

                let (writer, mut reader) = ws.split();
                let my_generation = generation.fetch_add(1, Ordering::SeqCst) + 1;

                {
                    let mut slot = accept_client.lock().await;
                    if slot.is_some() {
                        debug!("replacing previous receiver");
                        accept_session.lock().unwrap().mark_disconnected();
                    }
                    *slot = Some(writer);
                }
                {
                    let mut link = accept_session.lock().unwrap();
                    let _ = link.begin_connect(LinkRole::Sender);
                    let _ = link.complete_connect(&peer_addr.ip().to_string());
                }

                let read_session = accept_session.clone();
                let read_client = Arc::clone(&accept_client);
                let read_generation = Arc::clone(&generation);
                tokio::spawn(async move {
                    while let Some(message) = reader.next().await {
                        match message {
                            Ok(Message::Text(text)) => match codec::decode_frame(&text) {
                                Some(sample) => {
                                    read_session.lock().unwrap().deliver(sample);
                                }
                                None => read_session.lock().unwrap().note_dropped(),
                            },
                            Ok(Message::Close(_)) => break,
                            Ok(Message::Binary(_)) => read_session.lock().unwrap().note_dropped(),
                            Ok(_) => {}
                            Err(e) => {
                                debug!("socket error: {e}");
                                break;
                            }
                        }
                    }
                    if read_generation.load(Ordering::SeqCst) == my_generation {
                        read_client.lock().await.take();
                        read_session.lock().unwrap().mark_disconnected();
                        debug!("receiver disconnected");
                    }
                });
            }
        });

        Ok(Self {
            local_addr,
            accept_task,
            client,
            session,
        })
    }

    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Write one frame to the current receiver.
    ///
    /// A write failure means the socket itself is gone, so the link is torn
    /// down. There is no retry queue; the next sample is the retry.
    pub(crate) async fn send(&self, sample: &SensorSample) -> Result<()> {
        let frame = codec::encode_frame(sample)?;
        let mut slot = self.client.lock().await;
        let writer = slot.as_mut().ok_or(LinkError::NotConnected)?;
        if let Err(e) = writer.send(Message::Text(frame)).await {
            slot.take();
            drop(slot);
            self.session.lock().unwrap().mark_disconnected();
            return Err(WifiLinkError::Write(e.to_string()).into());
        }
        Ok(())
    }

    /// Stop accepting and drop the current receiver
    pub(crate) async fn shutdown(self) {
        self.accept_task.abort();
        if let Some(mut writer) = self.client.lock().await.take() {
            let _ = writer.close().await;
        }
        self.session.lock().unwrap().mark_disconnected();
    }
}
