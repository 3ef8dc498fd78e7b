use serde::{Deserialize, Serialize};

use crate::models::{Chat, Message};

/// Error code sent back for an undecodable inbound frame.
pub const ERR_CODE_INVALID_JSON: u16 = 1;

#[derive(Debug, Deserialize)]
pub struct ChatInbound {
    pub text: String,
    pub receiver_id: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ChatOutbound {
    #[serde(rename = "new_chat")]
    NewChat { chat: Chat },
    #[serde(rename = "message")]
    Message { message: Message },
    #[serde(rename = "error")]
    Error { err_msg: String, err_code: u16 },
}

impl ChatOutbound {
    pub fn invalid_json() -> Self {
        ChatOutbound::Error {
            err_msg: "invalid json".into(),
            err_code: ERR_CODE_INVALID_JSON,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn inbound_frame_parses() {
        let frame: ChatInbound = serde_json::from_str(r#"{"text":"hi","receiver_id":3}"#).unwrap();
        assert_eq!(frame.text, "hi");
        assert_eq!(frame.receiver_id, 3);
    }

    #[test]
    fn inbound_frame_rejects_missing_fields() {
        assert!(serde_json::from_str::<ChatInbound>(r#"{"text":"hi"}"#).is_err());
        assert!(serde_json::from_str::<ChatInbound>("not json").is_err());
    }

    #[test]
    fn error_frame_wire_shape() {
        let value = serde_json::to_value(ChatOutbound::invalid_json()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"type": "error", "err_msg": "invalid json", "err_code": 1})
        );
    }

    #[test]
    fn new_chat_frame_wire_shape() {
        let chat = Chat {
            id: 11,
            user1_id: 2,
            user2_id: 3,
            created_at: Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 0).unwrap(),
        };
        let value = serde_json::to_value(ChatOutbound::NewChat { chat }).unwrap();
        assert_eq!(value["type"], "new_chat");
        assert_eq!(value["chat"]["id"], 11);
        assert_eq!(value["chat"]["user1_id"], 2);
        assert_eq!(value["chat"]["user2_id"], 3);
        assert_eq!(value["chat"]["created_at"], "2025-05-04T12:00:00Z");
    }

    #[test]
    fn message_frame_wire_shape() {
        let message = Message {
            id: 5,
            author_id: 2,
            chat_id: 11,
            text: "hi".into(),
            created_at: Utc.with_ymd_and_hms(2025, 5, 4, 12, 0, 1).unwrap(),
        };
        let value = serde_json::to_value(ChatOutbound::Message { message }).unwrap();
        assert_eq!(value["type"], "message");
        assert_eq!(value["message"]["author_id"], 2);
        assert_eq!(value["message"]["chat_id"], 11);
        assert_eq!(value["message"]["text"], "hi");
    }
}
