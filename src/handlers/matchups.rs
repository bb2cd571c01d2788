use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::errors::Result;
use crate::handlers::parse_object_id;
use crate::models::{
    api::{ApiResponse, RecalculateQuery},
    matchup::Matchup,
};
use crate::services::scheduler::MatchupScheduler;
use crate::state::AppState;

/// POST /api/matchups/:id/calculate
pub async fn calculate_matchup(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(recalc): Query<RecalculateQuery>,
) -> Result<Json<ApiResponse<Matchup>>> {
    let matchup_id = parse_object_id(&id, "matchup")?;
    let matchup = MatchupScheduler::new(state.store.as_ref())
        .calculate_matchup(&matchup_id, recalc.force)
        .await?;
    Ok(Json(ApiResponse::ok(matchup)))
}
