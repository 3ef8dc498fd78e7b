use async_trait::async_trait;
use chrono::Utc;
use realtime_service::config::Config;
use realtime_service::error::{AppError, AppResult};
use realtime_service::models::{Chat, Message, Notification, NotificationPayload};
use realtime_service::repository::{ChatRepository, NotificationRepository};
use realtime_service::routes;
use realtime_service::services::auth_service::{AuthService, Principal};
use realtime_service::services::notification_service::NotificationDispatcher;
use realtime_service::state::AppState;
use realtime_service::websocket::{ConnectionRegistry, Topic};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

pub const VALID_SESSION: &str = "valid-session";

/// Accepts any user presenting the well-known test session id.
pub struct StaticAuth;

#[async_trait]
impl AuthService for StaticAuth {
    async fn check_auth(&self, user_id: i64, session_id: &str) -> AppResult<Principal> {
        if session_id == VALID_SESSION {
            Ok(Principal { user_id })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

pub struct MemoryChatRepository {
    chats: Mutex<Vec<Chat>>,
    messages: Mutex<Vec<Message>>,
    next_id: AtomicI64,
}

impl MemoryChatRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            chats: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        })
    }

    pub fn chat_count(&self) -> usize {
        self.chats.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatRepository for MemoryChatRepository {
    async fn create(&self, user1_id: i64, user2_id: i64) -> AppResult<Chat> {
        if user1_id == user2_id {
            return Err(AppError::BadRequest("chat participants must differ".into()));
        }
        if self.get_by_users(user1_id, user2_id).await?.is_some() {
            return Err(AppError::ChatAlreadyExists);
        }
        let chat = Chat {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user1_id,
            user2_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.chats.lock().unwrap().push(chat.clone());
        Ok(chat)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Chat>> {
        Ok(self.chats.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> AppResult<Vec<Chat>> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.has_participant(user_id))
            .cloned()
            .collect())
    }

    async fn get_by_users(&self, user1_id: i64, user2_id: i64) -> AppResult<Option<Chat>> {
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .find(|c| {
                (c.user1_id == user1_id && c.user2_id == user2_id)
                    || (c.user1_id == user2_id && c.user2_id == user1_id)
            })
            .cloned())
    }

    async fn chat_exists(&self, user1_id: i64, user2_id: i64) -> AppResult<bool> {
        Ok(self.get_by_users(user1_id, user2_id).await?.is_some())
    }

    async fn create_message(&self, author_id: i64, chat_id: i64, text: &str) -> AppResult<Message> {
        let chat = self.get(chat_id).await?.ok_or(AppError::NotFound)?;
        if !chat.has_participant(author_id) {
            return Err(AppError::Forbidden);
        }
        let message = Message {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            author_id,
            chat_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn messages_list(&self, chat_id: i64) -> AppResult<Vec<Message>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.chat_id == chat_id)
            .cloned()
            .collect())
    }
}

pub struct MemoryNotificationRepository {
    rows: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl MemoryNotificationRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        })
    }
}

#[async_trait]
impl NotificationRepository for MemoryNotificationRepository {
    async fn create(&self, user_id: i64, payload: &NotificationPayload) -> AppResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.rows.lock().unwrap().push(Notification {
            id,
            user_id,
            payload: payload.clone(),
            is_read: false,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> AppResult<Option<Notification>> {
        Ok(self.rows.lock().unwrap().iter().find(|n| n.id == id).cloned())
    }

    async fn list_unread_by_user(&self, user_id: i64) -> AppResult<Vec<Notification>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .cloned()
            .collect())
    }

    async fn mark_as_read(&self, id: i64, user_id: i64) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|n| n.id == id && n.user_id == user_id) {
            Some(row) => {
                row.is_read = true;
                Ok(())
            }
            None => Err(AppError::NotFound),
        }
    }
}

pub struct TestBackend {
    pub state: AppState,
    pub chats: Arc<MemoryChatRepository>,
    pub notifications: Arc<MemoryNotificationRepository>,
}

pub fn test_state() -> TestBackend {
    let chats = MemoryChatRepository::new();
    let notifications = MemoryNotificationRepository::new();
    let chat_registry = ConnectionRegistry::new(Topic::Chat);
    let notification_registry = ConnectionRegistry::new(Topic::Notifications);
    let dispatcher =
        NotificationDispatcher::new(notifications.clone(), notification_registry.clone());

    let state = AppState {
        config: Arc::new(Config {
            database_url: "postgres://unused".into(),
            database_max_connections: 1,
            port: 0,
        }),
        auth: Arc::new(StaticAuth),
        chats: chats.clone(),
        notifications: notifications.clone(),
        dispatcher,
        chat_registry,
        notification_registry,
    };

    TestBackend {
        state,
        chats,
        notifications,
    }
}

/// Serve the real router on an ephemeral port.
pub async fn spawn_server(state: AppState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let router = routes::build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    addr
}
