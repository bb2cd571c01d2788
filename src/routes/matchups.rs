use axum::{routing::post, Router};

use crate::handlers::matchups;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:id/calculate", post(matchups::calculate_matchup))
}
