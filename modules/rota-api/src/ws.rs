//! The realtime endpoint.
//!
//! Each socket gets a receive loop (this function) plus a writer task that
//! drains the connection's FIFO queue, the same queue the fanout relay
//! pushes into, so replies and events share one ordered stream. Clients
//! authenticate in-band; until then the connection sits in the registry's
//! holding area and receives no events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::registry::ConnectionHandle;
use crate::AppState;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Auth { token: String },
    Ping,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (conn, mut queue) = ConnectionHandle::open();
    let conn_id = conn.id;
    state.registry.register(conn.clone());
    debug!(%conn_id, "connection opened");

    let (mut sink, mut stream) = socket.split();

    // Writer task: connection queue -> socket, in FIFO order.
    let writer = tokio::spawn(async move {
        while let Some(payload) = queue.recv().await {
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings/pongs at the protocol level are handled by axum.
            _ => continue,
        };

        // Malformed frames are ignored; the connection stays up.
        let Ok(client_message) = serde_json::from_str::<ClientMessage>(&text) else {
            continue;
        };

        match client_message {
            ClientMessage::Auth { token } => {
                let reply = match state.auth.verify_token(&token) {
                    Some(user_id) => {
                        state.registry.authenticate(conn_id, &user_id);
                        debug!(%conn_id, %user_id, "connection authenticated");
                        r#"{"type":"auth_success"}"#
                    }
                    None => r#"{"type":"auth_failed"}"#,
                };
                if conn.send(reply).is_err() {
                    break;
                }
            }
            ClientMessage::Ping => {
                if conn.send(r#"{"type":"pong"}"#).is_err() {
                    break;
                }
            }
        }
    }

    state.registry.deregister(conn_id);
    writer.abort();
    debug!(%conn_id, "connection closed");
}
