//! In-process WebSocket servers for end-to-end tests.

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

pub type ServerSocket = WebSocketStream<TcpStream>;

/// Accept exactly one websocket connection on a loopback port and hand it to `handler`.
/// Returns the `ws://` endpoint to dial.
pub async fn spawn_server<F, Fut>(handler: F) -> String
where
    F: FnOnce(ServerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener addr");
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.expect("accept");
        let socket = tokio_tungstenite::accept_async(tcp).await.expect("server handshake");
        handler(socket).await;
    });
    format!("ws://{addr}")
}

/// Echo every data frame back until the client closes.
/// Reports how many close frames the server saw once the stream ends.
pub async fn spawn_echo_server() -> (String, oneshot::Receiver<usize>) {
    let (closes_tx, closes_rx) = oneshot::channel();
    let endpoint = spawn_server(|mut socket| async move {
        let mut closes = 0_usize;
        while let Some(Ok(message)) = socket.next().await {
            match message {
                Message::Text(_) | Message::Binary(_) => {
                    if socket.send(message).await.is_err() {
                        break;
                    }
                }
                Message::Close(_) => closes += 1,
                _ => {}
            }
        }
        let _ = closes_tx.send(closes);
    })
    .await;
    (endpoint, closes_rx)
}

/// Echo the first data frame, then close with 1000/"bye".
pub async fn spawn_close_after_first_message() -> String {
    spawn_server(|mut socket| async move {
        while let Some(Ok(message)) = socket.next().await {
            if matches!(message, Message::Text(_) | Message::Binary(_)) {
                let _ = socket.send(message).await;
                break;
            }
        }
        let _ = socket.close(Some(normal_close("bye"))).await;
        while let Some(Ok(_)) = socket.next().await {}
    })
    .await
}

/// Complete the handshake, then hold the socket without ever reading from it.
pub async fn spawn_silent_server() -> String {
    spawn_server(|socket| async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    })
    .await
}

/// Record every text frame until the stream ends.
pub async fn spawn_recording_server() -> (String, oneshot::Receiver<Vec<String>>) {
    let (seen_tx, seen_rx) = oneshot::channel();
    let endpoint = spawn_server(|mut socket| async move {
        let mut seen = Vec::new();
        while let Some(Ok(message)) = socket.next().await {
            if let Message::Text(text) = message {
                seen.push(text.to_string());
            }
        }
        let _ = seen_tx.send(seen);
    })
    .await;
    (endpoint, seen_rx)
}

/// A loopback endpoint with nothing listening on it.
pub async fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback listener");
    let addr = listener.local_addr().expect("listener addr");
    drop(listener);
    format!("ws://{addr}")
}

pub fn normal_close(reason: &str) -> CloseFrame {
    CloseFrame { code: CloseCode::Normal, reason: reason.to_owned().into() }
}
