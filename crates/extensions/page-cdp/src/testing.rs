//! Scriptable stand-in for a browser's DevTools socket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Reply to one request: a result, a CDP error, or silence.
pub(crate) enum Reply {
    Result(Value),
    Error(i64, String),
    Silent,
}

type Handler = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

/// A recorded request.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: String,
    pub params: Value,
    pub session_id: Option<String>,
}

pub(crate) struct FakeBrowser {
    pub ws_url: String,
    push: mpsc::UnboundedSender<Message>,
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeBrowser {
    /// Accepts a single client connection.
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_url = format!("ws://{}/devtools/browser/fake", listener.local_addr().unwrap());
        let (push, mut outbound) = mpsc::unbounded_channel::<Message>();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let recorded = calls.clone();
        tokio::spawn(async move {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                return;
            };
            let (mut sink, mut source) = ws.split();

            loop {
                tokio::select! {
                    msg = outbound.recv() => {
                        let Some(msg) = msg else { break };
                        let close = matches!(msg, Message::Close(_));
                        if sink.send(msg).await.is_err() || close {
                            break;
                        }
                    }
                    frame = source.next() => {
                        let Some(Ok(Message::Text(text))) = frame else { break };
                        let request: Value = serde_json::from_str(text.as_str()).unwrap();
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request.get("params").cloned().unwrap_or(Value::Null);
                        let session_id = request["sessionId"].as_str().map(str::to_string);
                        recorded.lock().push(Call {
                            method: method.clone(),
                            params: params.clone(),
                            session_id: session_id.clone(),
                        });

                        let mut response = match handler(&method, &params) {
                            Reply::Result(result) => json!({ "id": request["id"], "result": result }),
                            Reply::Error(code, message) => json!({
                                "id": request["id"],
                                "error": { "code": code, "message": message }
                            }),
                            Reply::Silent => continue,
                        };
                        if let Some(session_id) = session_id {
                            response["sessionId"] = json!(session_id);
                        }
                        if sink.send(Message::Text(response.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { ws_url, push, calls }
    }

    /// Push an event frame to the client.
    pub fn emit(&self, session_id: &str, method: &str, params: Value) {
        let frame = json!({ "method": method, "params": params, "sessionId": session_id });
        let _ = self.push.send(Message::Text(frame.to_string().into()));
    }

    /// Close the socket from the browser side.
    pub fn close(&self) {
        let _ = self.push.send(Message::Close(None));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method)
            .collect()
    }
}

/// Replies to the session bootstrap every test needs.
pub(crate) fn bootstrap(method: &str, params: &Value) -> Option<Reply> {
    match method {
        "Target.attachToTarget" => Some(Reply::Result(json!({
            "sessionId": format!("S-{}", params["targetId"].as_str().unwrap_or("?"))
        }))),
        "Page.enable" | "Runtime.enable" | "Runtime.addBinding" | "Target.activateTarget"
        | "Target.detachFromTarget" => Some(Reply::Result(json!({}))),
        "Page.addScriptToEvaluateOnNewDocument" => {
            Some(Reply::Result(json!({ "identifier": "1" })))
        }
        _ => None,
    }
}
