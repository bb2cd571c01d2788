use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::leagues;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/:id/schedule", post(leagues::generate_schedule))
        .route("/:id/matchups", get(leagues::list_matchups))
        .route("/:id/draft", post(leagues::run_draft))
        .route("/:id/records", post(leagues::update_records))
        .route("/:id/standings", get(leagues::standings))
}
