use axum::{routing::get, Router};

use crate::handlers::legislators;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:id/scores", get(legislators::weekly_scores))
}
