//! The single outbound WebSocket to the automation server.
//!
//! [`ConnectionManager`] never reconnects by itself. Every `connect()` builds a
//! fresh socket with its own tasks; a close or error tears all of it down and
//! flips the state back to [`ConnectionState::Disconnected`]. Retrying is the
//! caller's policy (see [`crate::supervisor`]).

mod error;
mod socket;

pub use error::ConnectionError;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{info, warn};
use vcp_bridge_config::ConnectionConfig;
use vcp_bridge_protocols::{endpoint_url, Channel, CommandEnvelope, WireMessage};

use socket::{Connection, Heartbeat};

/// Observable connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

/// Socket-level tuning.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub heartbeat_interval: Duration,
    /// `0` keeps missed acks advisory.
    pub missed_heartbeat_limit: u32,
    pub send_buffer: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            missed_heartbeat_limit: 0,
            send_buffer: 100,
        }
    }
}

impl From<&ConnectionConfig> for ConnectionSettings {
    fn from(config: &ConnectionConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            missed_heartbeat_limit: config.missed_heartbeat_limit,
            send_buffer: config.send_buffer,
        }
    }
}

struct Inner {
    settings: ConnectionSettings,
    current: Mutex<Option<Arc<Connection>>>,
    state: watch::Sender<ConnectionState>,
    commands_tx: mpsc::UnboundedSender<CommandEnvelope>,
    commands_rx: Mutex<Option<mpsc::UnboundedReceiver<CommandEnvelope>>>,
    next_id: AtomicU64,
    /// Bumped by every claim and every `disconnect()`; a handshake whose
    /// attempt number is stale has been abandoned.
    attempt: AtomicU64,
}

/// Owner of the (at most one) live connection. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(settings: ConnectionSettings) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                settings,
                current: Mutex::new(None),
                state,
                commands_tx,
                commands_rx: Mutex::new(Some(commands_rx)),
                next_id: AtomicU64::new(1),
                attempt: AtomicU64::new(0),
            }),
        }
    }

    /// Open the observer channel. Returns immediately when a connection is
    /// already open or being opened.
    pub async fn connect(&self, server_url: &str, key: &str) -> Result<(), ConnectionError> {
        let url =
            endpoint_url(server_url, Channel::Observer, key).map_err(ConnectionError::Endpoint)?;

        let attempt = {
            let _current = self.inner.current.lock();
            let claimed = self.inner.state.send_if_modified(|state| {
                if *state == ConnectionState::Disconnected {
                    *state = ConnectionState::Connecting;
                    true
                } else {
                    false
                }
            });
            if !claimed {
                return Ok(());
            }
            self.inner.attempt.fetch_add(1, Ordering::SeqCst) + 1
        };

        info!("Connecting to {}", redact(url.as_str()));
        let mut ws = match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((ws, _response)) => ws,
            Err(e) => {
                warn!("Connection to {} failed: {}", server_url, e);
                let _current = self.inner.current.lock();
                if self.inner.attempt.load(Ordering::SeqCst) == attempt {
                    self.inner.state.send_replace(ConnectionState::Disconnected);
                }
                return Err(e.into());
            }
        };

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        {
            // Held until the state is published, so a reader that stops
            // immediately cannot report the close before `Connected` is set.
            let mut current = self.inner.current.lock();
            if self.inner.attempt.load(Ordering::SeqCst) == attempt {
                let weak = Arc::downgrade(&self.inner);
                let connection = Connection::start(
                    id,
                    ws,
                    Heartbeat {
                        interval: self.inner.settings.heartbeat_interval,
                        missed_limit: self.inner.settings.missed_heartbeat_limit,
                    },
                    self.inner.settings.send_buffer,
                    self.inner.commands_tx.clone(),
                    move |id| on_closed(&weak, id),
                );
                *current = Some(Arc::new(connection));
                self.inner.state.send_replace(ConnectionState::Connected);
                info!("Connection {} established", id);
                return Ok(());
            }
        }

        info!("Connect to {} cancelled during handshake", server_url);
        let _ = ws.close(None).await;
        Ok(())
    }

    /// Close the socket if one is open, or abandon a handshake in progress.
    pub fn disconnect(&self) {
        let mut current = self.inner.current.lock();
        self.inner.attempt.fetch_add(1, Ordering::SeqCst);
        if let Some(connection) = current.take() {
            info!("Closing connection {}", connection.id);
            connection.close();
        }
        self.inner.state.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                false
            } else {
                *state = ConnectionState::Disconnected;
                true
            }
        });
    }

    /// Queue a frame on the open socket.
    pub async fn send(&self, message: &WireMessage) -> Result<(), ConnectionError> {
        let connection = self.inner.current.lock().clone();
        match connection {
            Some(connection) => connection.send(message).await,
            None => Err(ConnectionError::NotConnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Inbound commands from every connection, in arrival order. Can be
    /// taken once.
    pub fn take_commands(&self) -> Option<mpsc::UnboundedReceiver<CommandEnvelope>> {
        self.inner.commands_rx.lock().take()
    }

    /// When the server last acknowledged a heartbeat on the open socket.
    pub fn last_heartbeat_ack(&self) -> Option<Instant> {
        self.inner
            .current
            .lock()
            .as_ref()
            .and_then(|c| c.last_heartbeat_ack())
    }
}

fn on_closed(inner: &Weak<Inner>, id: u64) {
    let Some(inner) = inner.upgrade() else {
        return;
    };

    let mut current = inner.current.lock();
    // A stale socket closing must not clobber a newer one.
    if current.as_ref().is_some_and(|c| c.id == id) {
        *current = None;
        drop(current);
        inner.state.send_replace(ConnectionState::Disconnected);
        info!("Connection {} closed", id);
    }
}

/// Hide the key segment in logs.
fn redact(url: &str) -> String {
    match url.find("VCP_Key=") {
        Some(pos) => format!("{}VCP_Key=***", &url[..pos]),
        None => url.to_string(),
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
