pub mod auth;
pub mod error_handling;
pub mod logging;

use axum::Router;

/// Apply default middleware layers (logging, etc.)
pub fn with_defaults(router: Router) -> Router {
    logging::add_tracing(router)
}
