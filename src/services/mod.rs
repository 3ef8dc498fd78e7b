pub mod auth_service;
pub mod notification_service;
pub mod sanitize;
