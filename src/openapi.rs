/// OpenAPI documentation for the Pinly realtime service
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pinly Realtime Service API",
        version = "1.0.0",
        description = "Real-time chat and notification push over WebSockets",
        license(
            name = "MIT"
        )
    ),
    tags(
        (name = "Health", description = "Service health checks"),
        (name = "Chats", description = "Chat and message history catch-up"),
        (name = "Notifications", description = "Notification creation and unread catch-up"),
        (name = "WebSocket", description = "Real-time push via /chat and /notifications upgrades"),
    )
)]
pub struct ApiDoc;
