use axum::{middleware, routing::post, Router};

use crate::handlers::sync;
use crate::middleware::auth::cron_auth;
use crate::state::AppState;

/// Every route here requires the cron bearer secret.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync::sync_all))
        .route("/sync/:category", post(sync::sync_category))
        .route("/legislators", post(sync::sync_legislators))
        .route("/leagues/:id/week/:week", post(sync::calculate_week))
        .route_layer(middleware::from_fn_with_state(state, cron_auth))
}
