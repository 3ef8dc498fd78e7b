use crate::models::{Message, Notification, NotificationPayload};

/// Strip unsafe markup from user-authored text. Applied to every free-text
/// field on its way out of the service; stored text stays as submitted.
pub fn sanitize(text: &str) -> String {
    ammonia::clean(text)
}

pub fn sanitize_message(mut message: Message) -> Message {
    message.text = sanitize(&message.text);
    message
}

pub fn sanitize_notification(mut notification: Notification) -> Notification {
    if let NotificationPayload::NewComment { text, .. } = &mut notification.payload {
        *text = sanitize(text);
    }
    notification
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_script_tags() {
        let cleaned = sanitize("<script>alert(1)</script>hello");
        assert!(!cleaned.contains("script"));
        assert!(cleaned.contains("hello"));
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(sanitize("just a message"), "just a message");
    }

    #[test]
    fn sanitizes_comment_notification_text_only() {
        let notification = Notification {
            id: 1,
            user_id: 2,
            payload: NotificationPayload::NewComment {
                pin_id: 3,
                author_id: 4,
                text: "<img src=x onerror=alert(1)>nice".into(),
            },
            is_read: false,
            created_at: chrono::Utc::now(),
        };
        let cleaned = sanitize_notification(notification);
        match cleaned.payload {
            NotificationPayload::NewComment { text, .. } => {
                assert!(!text.contains("onerror"));
                assert!(text.contains("nice"));
            }
            other => panic!("payload variant changed: {other:?}"),
        }
    }
}
