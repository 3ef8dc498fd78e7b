use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};

use crate::state::AppState;

pub mod chats;
pub mod notifications;

// OpenAPI endpoint handler
async fn openapi_json() -> Json<serde_json::Value> {
    use utoipa::OpenApi;
    Json(serde_json::to_value(crate::openapi::ApiDoc::openapi()).unwrap())
}

pub fn build_router(state: AppState) -> Router {
    // Service introspection endpoints (no API version prefix)
    let introspection = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/openapi.json", get(openapi_json));

    // Pull-based catch-up surface; every route requires a valid session
    let api_v1 = Router::new()
        .route("/chats", get(chats::list_chats))
        .route("/chats/:id/messages", get(chats::messages_list))
        .route("/notifications", post(notifications::create_notification))
        .route("/notifications/unread", get(notifications::unread_notifications))
        .route("/notifications/:id/read", put(notifications::mark_notification_read))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::auth::auth_middleware,
        ));

    // WebSocket upgrade points; these authenticate in the handler because
    // browsers cannot attach headers to an upgrade request
    let sockets = Router::new()
        .route("/chat", get(crate::websocket::chat::ws_handler))
        .route("/notifications", get(crate::websocket::notifications::ws_handler));

    let router = introspection
        .merge(sockets)
        .nest("/api/v1", api_v1)
        .with_state(state);

    crate::middleware::with_defaults(router)
}
