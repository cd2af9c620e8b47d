//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpEvent, CdpRequest, CdpResponse, TargetInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type Pending = Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>;
type EventHandlers = RwLock<HashMap<String, mpsc::UnboundedSender<CdpEvent>>>;

/// The shared browser socket. Sessions multiplex over it by `sessionId`.
pub(crate) struct Transport {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Pending,
    event_handlers: EventHandlers,
    timeout: Duration,
    closed: AtomicBool,
}

impl Transport {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CdpError::SessionClosed);
        }
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut ws = self.ws_tx.lock().await;
            if let Err(e) = ws.send(Message::Text(json.into())).await {
                self.pending.lock().remove(&id);
                return Err(e.into());
            }
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) async fn subscribe(&self, session_id: &str) -> mpsc::UnboundedReceiver<CdpEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.event_handlers
            .write()
            .await
            .insert(session_id.to_string(), tx);
        rx
    }

    pub(crate) async fn unsubscribe(&self, session_id: &str) {
        self.event_handlers.write().await.remove(session_id);
    }
}

/// CDP client for browser automation.
pub struct CdpClient {
    browser_ws_url: String,
    transport: Arc<Transport>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at its HTTP debugging endpoint
    /// (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str, timeout: Duration) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/');

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::ChromeNotAvailable(format!("{}: {}", endpoint, e)))?;

        debug!("Connected to browser: {}", version.browser);
        Self::connect_ws(&version.web_socket_debugger_url, timeout).await
    }

    /// Connect straight to a browser WebSocket URL.
    pub async fn connect_ws(browser_ws_url: &str, timeout: Duration) -> Result<Self, CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url)
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let transport = Arc::new(Transport {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            event_handlers: RwLock::new(HashMap::new()),
            timeout,
            closed: AtomicBool::new(false),
        });

        let recv_task = tokio::spawn(receive_loop(ws_source, Arc::downgrade(&transport)));

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            browser_ws_url: browser_ws_url.to_string(),
            transport,
            recv_task,
        })
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Browser-level command (no session).
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(result["targetInfos"].clone())?;
        Ok(targets)
    }

    /// Open a new tab at `url` and return its target id.
    pub async fn create_target(&self, url: &str) -> Result<String, CdpError> {
        let result = self
            .call("Target.createTarget", Some(json!({ "url": url })))
            .await?;
        result["targetId"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))
    }

    /// Bring a tab to the foreground.
    pub async fn activate_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.activateTarget", Some(json!({ "targetId": target_id })))
            .await?;
        Ok(())
    }

    pub async fn close_target(&self, target_id: &str) -> Result<(), CdpError> {
        self.call("Target.closeTarget", Some(json!({ "targetId": target_id })))
            .await?;
        Ok(())
    }

    /// Attach a flat session to a target and enable the domains pages need.
    pub async fn attach(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let events = self.transport.subscribe(&session_id).await;
        let session = PageSession::new(
            target_id.to_string(),
            session_id,
            self.transport.clone(),
            events,
        );

        session.enable_domains().await?;
        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn receive_loop(mut ws_source: WsSource, weak: std::sync::Weak<Transport>) {
    while let Some(msg) = ws_source.next().await {
        let Some(transport) = weak.upgrade() else {
            return;
        };

        match msg {
            Ok(Message::Text(text)) => {
                trace!("CDP recv: {}", text.as_str());
                match serde_json::from_str::<CdpResponse>(text.as_str()) {
                    Ok(resp) => dispatch(&transport, resp).await,
                    Err(e) => warn!("Failed to parse CDP message: {}", e),
                }
            }
            Ok(Message::Close(_)) => {
                debug!("Browser WebSocket closed");
                break;
            }
            Err(e) => {
                error!("Browser WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Fail whatever is still waiting and end every session's event stream.
    if let Some(transport) = weak.upgrade() {
        transport.closed.store(true, Ordering::SeqCst);
        transport.pending.lock().clear();
        transport.event_handlers.write().await.clear();
    }
}

async fn dispatch(transport: &Transport, resp: CdpResponse) {
    if let Some(id) = resp.id {
        let waiter = transport.pending.lock().remove(&id);
        if let Some(tx) = waiter {
            let result = match resp.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(resp.result.unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        }
        return;
    }

    let session_id = resp.session_id.clone().unwrap_or_default();
    if let Some(event) = CdpEvent::from_response(resp) {
        let handlers = transport.event_handlers.read().await;
        if let Some(tx) = handlers.get(&session_id) {
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
