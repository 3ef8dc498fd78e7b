use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, warn};

use crate::state::AppState;
use crate::websocket::chat::WsAuthParams;
use crate::websocket::{ChannelSink, ConnectionSink};

/// `GET /notifications`: authenticate, then hold the socket open for
/// notification pushes. There is no inbound protocol; reads only detect
/// disconnection.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let principal = match state.auth.check_auth(params.user_id, &params.session_id).await {
        Ok(principal) => principal,
        Err(e) => {
            warn!(user_id = params.user_id, error = %e, "notification socket rejected");
            return e.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, principal.user_id, socket))
}

async fn handle_socket(state: AppState, user_id: i64, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = unbounded_channel::<String>();
    let sink: Arc<dyn ConnectionSink> = Arc::new(ChannelSink::new(tx));
    let connection_id = state.notification_registry.add(user_id, sink).await;

    loop {
        tokio::select! {
            queued = rx.recv() => {
                match queued {
                    Some(payload) => {
                        if sender.send(WsMessage::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {} // liveness only; inbound content is ignored
                    Some(Err(e)) => {
                        debug!(user_id, error = %e, "notification socket read failed");
                        break;
                    }
                }
            }
        }
    }

    state.notification_registry.remove(user_id, connection_id).await;
}
