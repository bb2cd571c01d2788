use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Guards the cron triggers: `Authorization: Bearer <CRON_SECRET>`. With no
/// secret configured every request is refused.
pub async fn cron_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = headers
        .get("authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim);

    match (state.config.cron_secret.as_deref(), token) {
        (Some(secret), Some(token)) if constant_time_eq(secret.as_bytes(), token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        (None, _) => {
            warn!(path = %request.uri().path(), "CRON_SECRET is not set, refusing trigger");
            Err(AppError::Unauthorized)
        }
        _ => {
            warn!(path = %request.uri().path(), "Rejected cron trigger with bad credentials");
            Err(AppError::Unauthorized)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
