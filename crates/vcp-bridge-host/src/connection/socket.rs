//! One live WebSocket and its writer, reader and heartbeat tasks.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use vcp_bridge_protocols::{decode, encode, CommandEnvelope, WireMessage};

use super::ConnectionError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Per-connection heartbeat policy.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Heartbeat {
    pub interval: Duration,
    /// Close after this many unanswered heartbeats; `0` never closes.
    pub missed_limit: u32,
}

/// A single socket. Never reused: a reconnect builds a new one.
pub(crate) struct Connection {
    pub id: u64,
    outbound: mpsc::Sender<Message>,
    cancel: CancellationToken,
    last_ack: Arc<Mutex<Option<Instant>>>,
}

impl Connection {
    /// Split the socket and start its tasks. `on_closed` runs once the
    /// reader stops, whatever the reason.
    pub fn start<F>(
        id: u64,
        ws: WsStream,
        heartbeat: Heartbeat,
        send_buffer: usize,
        commands: mpsc::UnboundedSender<CommandEnvelope>,
        on_closed: F,
    ) -> Self
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let (sink, source) = ws.split();
        let (outbound, outbound_rx) = mpsc::channel(send_buffer.max(1));
        let cancel = CancellationToken::new();
        let last_ack = Arc::new(Mutex::new(None));
        let missed = Arc::new(AtomicU32::new(0));

        tokio::spawn(write_loop(id, sink, outbound_rx, cancel.clone()));
        tokio::spawn(heartbeat_loop(
            id,
            heartbeat,
            outbound.clone(),
            missed.clone(),
            cancel.clone(),
        ));

        let reader_cancel = cancel.clone();
        let reader_ack = last_ack.clone();
        tokio::spawn(async move {
            read_loop(id, source, commands, reader_ack, missed, reader_cancel.clone()).await;
            reader_cancel.cancel();
            on_closed(id);
        });

        Self {
            id,
            outbound,
            cancel,
            last_ack,
        }
    }

    pub async fn send(&self, message: &WireMessage) -> Result<(), ConnectionError> {
        let json = encode(message)?;
        self.outbound
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| ConnectionError::NotConnected)
    }

    pub fn last_heartbeat_ack(&self) -> Option<Instant> {
        *self.last_ack.lock()
    }

    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn write_loop(
    id: u64,
    mut sink: WsSink,
    mut outbound: mpsc::Receiver<Message>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }
            msg = outbound.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = sink.send(msg).await {
                    warn!("Connection {} write failed: {}", id, e);
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    debug!("Connection {} writer stopped", id);
}

async fn heartbeat_loop(
    id: u64,
    heartbeat: Heartbeat,
    outbound: mpsc::Sender<Message>,
    missed: Arc<AtomicU32>,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + heartbeat.interval, heartbeat.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let unanswered = missed.load(Ordering::SeqCst);
                if heartbeat.missed_limit > 0 && unanswered >= heartbeat.missed_limit {
                    warn!(
                        "Connection {}: {} heartbeats unanswered, closing",
                        id, unanswered
                    );
                    cancel.cancel();
                    break;
                }
                if unanswered > 0 {
                    debug!("Connection {}: {} heartbeats unanswered", id, unanswered);
                }

                let json = match encode(&WireMessage::heartbeat()) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode heartbeat: {}", e);
                        continue;
                    }
                };
                if outbound.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                missed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

async fn read_loop(
    id: u64,
    mut source: WsSource,
    commands: mpsc::UnboundedSender<CommandEnvelope>,
    last_ack: Arc<Mutex<Option<Instant>>>,
    missed: Arc<AtomicU32>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                debug!("Connection {} recv: {}", id, text.as_str());
                match decode(text.as_str()) {
                    Ok(WireMessage::HeartbeatAck { .. }) => {
                        *last_ack.lock() = Some(Instant::now());
                        missed.store(0, Ordering::SeqCst);
                    }
                    Ok(WireMessage::Command { data }) => {
                        if commands.send(data).is_err() {
                            warn!("Connection {}: no command consumer, dropping command", id);
                        }
                    }
                    Ok(other) => {
                        debug!("Connection {}: ignoring {} frame", id, other.kind());
                    }
                    Err(e) => {
                        warn!("Connection {}: dropping malformed frame: {}", id, e);
                    }
                }
            }
            Some(Ok(Message::Close(frame))) => {
                match frame {
                    Some(frame) => info!(
                        "Connection {} closed by server: code={} reason={}",
                        id,
                        u16::from(frame.code),
                        frame.reason.as_str()
                    ),
                    None => info!("Connection {} closed by server", id),
                }
                break;
            }
            Some(Ok(Message::Binary(_))) => {
                debug!("Connection {}: ignoring binary frame", id);
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                error!("Connection {} error: {}", id, e);
                break;
            }
            None => {
                info!("Connection {} stream ended", id);
                break;
            }
        }
    }
}
