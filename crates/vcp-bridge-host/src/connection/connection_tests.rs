use super::*;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::handshake::derive_accept_key;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use vcp_bridge_protocols::decode;

type ServerSocket = WebSocketStream<TcpStream>;

/// Local server handing every accepted socket (and its request path) to the test.
async fn server() -> (String, mpsc::UnboundedReceiver<(String, ServerSocket)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let path = Arc::new(Mutex::new(String::new()));
            let seen = path.clone();
            let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                *seen.lock() = req.uri().path().to_string();
                Ok(resp)
            };
            if let Ok(ws) = tokio_tungstenite::accept_hdr_async(stream, callback).await {
                let path = path.lock().clone();
                let _ = tx.send((path, ws));
            }
        }
    });

    (format!("ws://{}", addr), rx)
}

fn settings(heartbeat_ms: u64, missed_limit: u32) -> ConnectionSettings {
    ConnectionSettings {
        heartbeat_interval: Duration::from_millis(heartbeat_ms),
        missed_heartbeat_limit: missed_limit,
        send_buffer: 16,
    }
}

async fn next_text(ws: &mut ServerSocket) -> String {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame in time")
            .expect("socket open")
            .expect("valid frame");
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
}

async fn wait_for_state(manager: &ConnectionManager, wanted: ConnectionState) {
    let mut rx = manager.subscribe_state();
    timeout(Duration::from_secs(5), rx.wait_for(|s| *s == wanted))
        .await
        .expect("state change in time")
        .unwrap();
}

#[tokio::test]
async fn test_connect_uses_observer_path() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));

    manager.connect(&url, "secret").await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);

    let (path, _ws) = accepted.recv().await.unwrap();
    assert_eq!(path, "/vcp-chrome-observer/VCP_Key=secret");
}

#[tokio::test]
async fn test_connect_is_noop_when_connected() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));

    manager.connect(&url, "k").await.unwrap();
    manager.connect(&url, "k").await.unwrap();

    let _first = accepted.recv().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(accepted.try_recv().is_err());
}

#[tokio::test]
async fn test_invalid_endpoint_is_rejected() {
    let manager = ConnectionManager::new(ConnectionSettings::default());
    let err = manager.connect("http://localhost:1", "k").await.unwrap_err();
    assert!(matches!(err, ConnectionError::Endpoint(_)));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_refused_connection_returns_to_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let manager = ConnectionManager::new(ConnectionSettings::default());
    let err = manager.connect(&format!("ws://{}", addr), "k").await.unwrap_err();
    assert!(matches!(err, ConnectionError::WebSocket(_)));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_send_without_connection_fails() {
    let manager = ConnectionManager::new(ConnectionSettings::default());
    let err = manager.send(&WireMessage::page_info("x")).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotConnected));
}

#[tokio::test]
async fn test_send_reaches_server() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));
    manager.connect(&url, "k").await.unwrap();
    let (_, mut ws) = accepted.recv().await.unwrap();

    manager.send(&WireMessage::page_info("# Hi")).await.unwrap();
    let text = next_text(&mut ws).await;
    assert_eq!(
        decode(&text).unwrap(),
        WireMessage::page_info("# Hi")
    );
}

#[tokio::test]
async fn test_heartbeats_are_sent_and_acks_recorded() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(50, 0));
    manager.connect(&url, "k").await.unwrap();
    let (_, mut ws) = accepted.recv().await.unwrap();
    assert!(manager.last_heartbeat_ack().is_none());

    let text = next_text(&mut ws).await;
    assert!(matches!(decode(&text).unwrap(), WireMessage::Heartbeat { .. }));

    ws.send(Message::Text(r#"{"type":"heartbeat_ack"}"#.into()))
        .await
        .unwrap();
    timeout(Duration::from_secs(5), async {
        while manager.last_heartbeat_ack().is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_commands_are_forwarded_and_garbage_dropped() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));
    let mut commands = manager.take_commands().unwrap();
    assert!(manager.take_commands().is_none());

    manager.connect(&url, "k").await.unwrap();
    let (_, mut ws) = accepted.recv().await.unwrap();

    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"mystery"}"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(
        r#"{"type":"command","data":{"requestId":"r1","command":"click","target":"vcp-id-1"}}"#
            .into(),
    ))
    .await
    .unwrap();

    let envelope = timeout(Duration::from_secs(5), commands.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(envelope.request_id, "r1");
    assert_eq!(envelope.command, "click");
    assert!(manager.is_connected());
}

#[tokio::test]
async fn test_server_close_marks_disconnected() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));
    manager.connect(&url, "bad-key").await.unwrap();
    let (_, mut ws) = accepted.recv().await.unwrap();

    ws.close(Some(CloseFrame {
        code: CloseCode::Policy,
        reason: "invalid key".into(),
    }))
    .await
    .unwrap();

    wait_for_state(&manager, ConnectionState::Disconnected).await;
    assert!(matches!(
        manager.send(&WireMessage::heartbeat()).await,
        Err(ConnectionError::NotConnected)
    ));
}

#[tokio::test]
async fn test_reconnect_creates_fresh_connection() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));

    manager.connect(&url, "k").await.unwrap();
    let (_, first) = accepted.recv().await.unwrap();
    drop(first);
    wait_for_state(&manager, ConnectionState::Disconnected).await;

    manager.connect(&url, "k").await.unwrap();
    let (_, mut second) = accepted.recv().await.unwrap();
    manager.send(&WireMessage::page_info("again")).await.unwrap();
    assert!(next_text(&mut second).await.contains("again"));
}

#[tokio::test]
async fn test_disconnect_closes_socket() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));
    manager.connect(&url, "k").await.unwrap();
    let (_, mut ws) = accepted.recv().await.unwrap();

    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    let closed = timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());
}

#[tokio::test]
async fn test_missed_heartbeat_limit_closes() {
    let (url, mut accepted) = server().await;
    let manager = ConnectionManager::new(settings(30, 2));
    manager.connect(&url, "k").await.unwrap();
    let (_, _ws) = accepted.recv().await.unwrap();

    wait_for_state(&manager, ConnectionState::Disconnected).await;
}

/// Server that completes the upgrade and sends Close(4000) in the same write,
/// the way an automation server rejects a bad key.
async fn closing_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&request);
                let key = request
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("sec-websocket-key")
                            .then(|| value.trim().to_string())
                    })
                    .unwrap();

                let mut reply = format!(
                    "HTTP/1.1 101 Switching Protocols\r\n\
                     Upgrade: websocket\r\n\
                     Connection: Upgrade\r\n\
                     Sec-WebSocket-Accept: {}\r\n\r\n",
                    derive_accept_key(key.as_bytes())
                )
                .into_bytes();
                reply.extend_from_slice(&[0x88, 0x02, 0x0f, 0xa0]);
                let _ = stream.write_all(&reply).await;
                let _ = stream.read(&mut buf).await;
            });
        }
    });

    format!("ws://{}", addr)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_immediate_server_close_never_sticks_connected() {
    let url = closing_server().await;
    let manager = ConnectionManager::new(settings(60_000, 0));

    for _ in 0..50 {
        manager.connect(&url, "bad-key").await.unwrap();
        wait_for_state(&manager, ConnectionState::Disconnected).await;
        assert!(matches!(
            manager.send(&WireMessage::heartbeat()).await,
            Err(ConnectionError::NotConnected)
        ));
    }
}

#[tokio::test]
async fn test_disconnect_during_handshake_wins() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        if let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await {
            while let Some(Ok(_)) = ws.next().await {}
        }
    });

    let manager = ConnectionManager::new(settings(60_000, 0));
    let pending = {
        let manager = manager.clone();
        let url = url.clone();
        tokio::spawn(async move { manager.connect(&url, "k").await })
    };
    wait_for_state(&manager, ConnectionState::Connecting).await;

    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    timeout(Duration::from_secs(5), pending)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(matches!(
        manager.send(&WireMessage::heartbeat()).await,
        Err(ConnectionError::NotConnected)
    ));
}

#[test]
fn test_redact_hides_key() {
    assert_eq!(
        redact("ws://h/vcp-chrome-observer/VCP_Key=secret"),
        "ws://h/vcp-chrome-observer/VCP_Key=***"
    );
    assert_eq!(redact("ws://h/"), "ws://h/");
}

#[test]
fn test_settings_from_config() {
    let config = ConnectionConfig {
        heartbeat_interval_secs: 10,
        missed_heartbeat_limit: 3,
        send_buffer: 7,
    };
    let settings = ConnectionSettings::from(&config);
    assert_eq!(settings.heartbeat_interval, Duration::from_secs(10));
    assert_eq!(settings.missed_heartbeat_limit, 3);
    assert_eq!(settings.send_buffer, 7);
}
