use axum::{routing::put, Router};

use crate::handlers::teams;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/:id/bench", put(teams::update_team_bench))
}
