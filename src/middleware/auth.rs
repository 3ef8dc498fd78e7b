use crate::error::AppError;
use crate::services::auth_service::Principal;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

const USER_ID_HEADER: &str = "x-user-id";
const SESSION_ID_HEADER: &str = "x-session-id";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)
}

/// Middleware to resolve the session against the authenticator and add the
/// principal to request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id: i64 = header_str(req.headers(), USER_ID_HEADER)?
        .parse()
        .map_err(|_| AppError::Unauthorized)?;
    let session_id = header_str(req.headers(), SESSION_ID_HEADER)?.to_string();

    let principal: Principal = state.auth.check_auth(user_id, &session_id).await?;

    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
