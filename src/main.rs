use realtime_service::{
    config::Config,
    db, error, logging, migrations,
    repository::{ChatRepository, NotificationRepository, PgChatRepository, PgNotificationRepository},
    routes,
    services::{auth_service::{AuthService, PgSessionAuth}, notification_service::NotificationDispatcher},
    state::AppState,
    websocket::{ConnectionRegistry, Topic},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(Config::from_env()?);

    let db = db::init_pool(&cfg.database_url, cfg.database_max_connections)
        .await
        .map_err(|e| error::AppError::StartServer(format!("db: {e}")))?;

    // Run embedded migrations (idempotent)
    // Treat migration failures as fatal - the schema must be in sync
    migrations::run_all(&db)
        .await
        .map_err(|e| error::AppError::StartServer(format!("database migrations failed: {e}")))?;

    let chat_registry = ConnectionRegistry::new(Topic::Chat);
    let notification_registry = ConnectionRegistry::new(Topic::Notifications);

    let auth: Arc<dyn AuthService> = Arc::new(PgSessionAuth::new(db.clone()));
    let chats: Arc<dyn ChatRepository> = Arc::new(PgChatRepository::new(db.clone()));
    let notifications: Arc<dyn NotificationRepository> =
        Arc::new(PgNotificationRepository::new(db.clone()));
    let dispatcher = NotificationDispatcher::new(notifications.clone(), notification_registry.clone());

    let state = AppState {
        config: cfg.clone(),
        auth,
        chats,
        notifications,
        dispatcher,
        chat_registry,
        notification_registry,
    };

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting realtime-service");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    axum::serve(listener, routes::build_router(state))
        .await
        .map_err(|e| error::AppError::StartServer(e.to_string()))?;

    Ok(())
}
