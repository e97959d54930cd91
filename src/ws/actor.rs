//! WebSocket transport: accept loop and actor-per-connection.
//!
//! The first text frame on a new socket is the credential. Verification
//! failures close the socket with code 4401; on success the connection is
//! registered and the actor forwards queued [`LiveEvent`]s to the sink as
//! JSON text frames. When the handle is superseded by a newer connect for
//! the same identity, the channel drains to `None` and the actor exits
//! without touching the newer registration.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::state::AppState;
use crate::ws::{ClientHandle, LiveEvent};

/// Close code for a failed credential, in the application range.
const CLOSE_UNAUTHENTICATED: u16 = 4401;

/// How long a fresh socket may take to present its credential.
const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Accept loop: one spawned actor per inbound socket.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            tracing::debug!(%peer, "inbound transport connection");
            run_connection(stream, state).await;
        });
    }
}

/// Handshake, authenticate, register, then pump events until either side
/// goes away.
pub async fn run_connection(stream: TcpStream, state: AppState) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::debug!(error = %e, "websocket handshake failed");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws.split();

    // First frame is the credential.
    let credential = match timeout(AUTH_TIMEOUT, ws_receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text.to_string(),
        _ => {
            let _ = ws_sender
                .send(close_frame("credential expected"))
                .await;
            return;
        }
    };

    let identity = match state.verifier.verify(&credential).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!(error = %e, "websocket auth failed");
            let _ = ws_sender.send(close_frame("unauthenticated")).await;
            return;
        }
    };

    let (handle, mut rx) = ClientHandle::channel();
    let handle_id = handle.id();
    state.registry.connect(&identity, handle);
    tracing::info!(identity = %identity, "websocket actor started");

    // Ack registration so clients know pushes can start flowing.
    let ready = LiveEvent { kind: "ready", data: json!({ "identity": identity }) };
    if send_event(&mut ws_sender, &ready).await.is_err() {
        state.registry.disconnect_handle(&identity, handle_id);
        return;
    }

    loop {
        tokio::select! {
            queued = rx.recv() => match queued {
                Some(event) => {
                    if send_event(&mut ws_sender, &event).await.is_err() {
                        break;
                    }
                }
                // All handle clones dropped: this connection was superseded.
                None => break,
            },
            incoming = ws_receiver.next() => match incoming {
                Some(Ok(Message::Ping(data))) => {
                    let _ = ws_sender.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(identity = %identity, reason = ?frame, "client closed");
                    break;
                }
                Some(Ok(_)) => {
                    // Server-push socket; other client frames are ignored.
                }
                Some(Err(e)) => {
                    tracing::debug!(identity = %identity, error = %e, "websocket receive error");
                    break;
                }
                None => break,
            },
        }
    }

    // Only remove our own registration; a superseding connect stays.
    state.registry.disconnect_handle(&identity, handle_id);
    tracing::info!(identity = %identity, "websocket actor stopped");
}

async fn send_event<S>(sink: &mut S, event: &LiveEvent) -> Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(_) => return Ok(()),
    };
    sink.send(Message::Text(text.into())).await.map_err(|_| ())
}

fn close_frame(reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::from(CLOSE_UNAUTHENTICATED),
        reason: reason.into(),
    }))
}
