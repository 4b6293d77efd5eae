// WebSocket command surface: one JSON command per text frame, one JSON
// response per frame.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{info, warn};

use crate::app::App;

/// What to do with one inbound WebSocket message.
#[derive(Debug, PartialEq)]
pub enum FrameAction {
    /// Send this JSON response back to the client.
    Reply(String),
    /// Control frame (ping/pong/binary); nothing to send.
    Ignore,
    /// Client closed the connection; stop reading.
    Stop,
}

/// Map one inbound message to a frame action. Pure logic, no I/O; this is
/// the primary unit-test target for the transport layer.
pub fn frame_action(app: &App, message: &Message) -> FrameAction {
    match message {
        Message::Text(text) => FrameAction::Reply(app.handle(text)),
        Message::Close(_) => FrameAction::Stop,
        _ => FrameAction::Ignore,
    }
}

/// Accept connections on `listener` and serve each in its own task.
/// Runs until the task is cancelled or the process exits.
pub async fn run(listener: TcpListener, app: Arc<App>) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");

        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake failed for {addr_str}: {e}");
                continue;
            }
        };

        let app = app.clone();
        tokio::spawn(async move {
            serve_connection(ws_stream, &app, &addr_str).await;
            info!("Connection from {addr_str} closed");
        });
    }
}

/// Read frames from one connection, replying per `frame_action` until the
/// client closes, the stream errors, or a write fails.
pub async fn serve_connection<S>(ws_stream: WebSocketStream<S>, app: &App, addr: &str)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg_result) = read.next().await {
        let message = match msg_result {
            Ok(m) => m,
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
        };

        match frame_action(app, &message) {
            FrameAction::Reply(response) => {
                if write.send(Message::Text(response.into())).await.is_err() {
                    warn!("Failed to write response to {addr}");
                    break;
                }
            }
            FrameAction::Ignore => {}
            FrameAction::Stop => {
                info!("Client {addr} sent close frame");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
