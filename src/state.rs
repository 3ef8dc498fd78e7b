use crate::{
    config::Config,
    repository::{ChatRepository, NotificationRepository},
    services::{auth_service::AuthService, notification_service::NotificationDispatcher},
    websocket::ConnectionRegistry,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthService>,
    pub chats: Arc<dyn ChatRepository>,
    pub notifications: Arc<dyn NotificationRepository>,
    pub dispatcher: NotificationDispatcher,
    pub chat_registry: ConnectionRegistry,
    pub notification_registry: ConnectionRegistry,
}
