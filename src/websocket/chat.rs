use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::models::Chat;
use crate::repository::ChatRepository;
use crate::services::sanitize::sanitize_message;
use crate::state::AppState;
use crate::websocket::message_types::{ChatInbound, ChatOutbound};
use crate::websocket::{ChannelSink, ConnectionRegistry, ConnectionSink};

#[derive(Debug, Deserialize)]
pub struct WsAuthParams {
    pub user_id: i64,
    pub session_id: String,
}

/// `GET /chat`: authenticate, then upgrade into the per-connection chat
/// session loop.
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsAuthParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let principal = match state.auth.check_auth(params.user_id, &params.session_id).await {
        Ok(principal) => principal,
        Err(e) => {
            warn!(user_id = params.user_id, error = %e, "chat socket rejected");
            return e.into_response();
        }
    };

    ws.on_upgrade(move |socket| async move {
        if let Err(e) = handle_socket(state, principal.user_id, socket).await {
            warn!(user_id = principal.user_id, error = %e, "chat session ended with error");
        }
    })
}

async fn handle_socket(state: AppState, user_id: i64, socket: WebSocket) -> AppResult<()> {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = unbounded_channel::<String>();
    let sink: Arc<dyn ConnectionSink> = Arc::new(ChannelSink::new(tx));
    let connection_id = state.chat_registry.add(user_id, sink.clone()).await;

    let result = loop {
        tokio::select! {
            // Outbound: drain broadcasts queued for this connection
            queued = rx.recv() => {
                match queued {
                    Some(payload) => {
                        if sender.send(WsMessage::Text(payload)).await.is_err() {
                            break Ok(());
                        }
                    }
                    None => break Ok(()),
                }
            }

            // Inbound: one chat frame per message
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Err(e) = process_frame(
                            state.chats.as_ref(),
                            &state.chat_registry,
                            user_id,
                            &text,
                            sink.as_ref(),
                        )
                        .await
                        {
                            break Err(e);
                        }
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break Ok(()),
                    Some(Ok(_)) => {} // ping/pong handled by the framework, binary ignored
                    Some(Err(e)) => {
                        debug!(user_id, error = %e, "chat socket read failed");
                        break Ok(());
                    }
                }
            }
        }
    };

    state.chat_registry.remove(user_id, connection_id).await;
    result
}

/// Handle one inbound chat frame.
///
/// A decode failure is answered inline and keeps the connection open; every
/// other error is fatal to the connection and surfaces to the caller.
pub async fn process_frame(
    chats: &dyn ChatRepository,
    registry: &ConnectionRegistry,
    sender_id: i64,
    raw: &str,
    own: &dyn ConnectionSink,
) -> AppResult<()> {
    let frame: ChatInbound = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(_) => {
            let reply = serde_json::to_string(&ChatOutbound::invalid_json())
                .map_err(|_| AppError::Internal)?;
            // If even the error frame cannot be written the connection is gone.
            return own.send_text(reply).map_err(|_| AppError::ConnectionClosed);
        }
    };

    let (chat, created) = resolve_chat(chats, sender_id, frame.receiver_id).await?;

    // Persisted before any push: a crash past this point loses a live
    // broadcast, never durable data.
    let message = chats.create_message(sender_id, chat.id, &frame.text).await?;

    if created {
        let event = ChatOutbound::NewChat { chat: chat.clone() };
        registry.broadcast(chat.user1_id, &event).await?;
        registry.broadcast(chat.user2_id, &event).await?;
    }

    // Fan the message out on its own task. It is not synchronized with the
    // new_chat broadcast above, so a slow peer connection may observe the
    // message frame first.
    let registry = registry.clone();
    tokio::spawn(async move {
        let event = ChatOutbound::Message {
            message: sanitize_message(message),
        };
        for participant in [chat.user1_id, chat.user2_id] {
            if let Err(e) = registry.broadcast(participant, &event).await {
                warn!(user_id = participant, chat_id = chat.id, error = %e, "message push failed");
            }
        }
    });

    Ok(())
}

/// Resolve the chat for an unordered participant pair, creating it on first
/// contact. Losing the unique-pair creation race resolves to the existing
/// chat rather than an error.
async fn resolve_chat(
    chats: &dyn ChatRepository,
    sender_id: i64,
    receiver_id: i64,
) -> AppResult<(Chat, bool)> {
    if sender_id == receiver_id {
        return Err(AppError::BadRequest("cannot open a chat with yourself".into()));
    }

    if let Some(chat) = chats.get_by_users(sender_id, receiver_id).await? {
        return Ok((chat, false));
    }

    match chats.create(sender_id, receiver_id).await {
        Ok(chat) => Ok((chat, true)),
        Err(AppError::ChatAlreadyExists) => {
            let chat = chats
                .get_by_users(sender_id, receiver_id)
                .await?
                .ok_or(AppError::Internal)?;
            Ok((chat, false))
        }
        Err(e) => Err(e),
    }
}
