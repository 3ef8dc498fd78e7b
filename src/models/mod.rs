pub mod chat;
pub mod message;
pub mod notification;

pub use chat::Chat;
pub use message::Message;
pub use notification::{Notification, NotificationPayload};
