pub mod chats;
pub mod notifications;

pub use chats::{ChatRepository, PgChatRepository};
pub use notifications::{NotificationRepository, PgNotificationRepository};
