use axum::{
    extract::{Path, State},
    response::Json,
};
use validator::Validate;

use crate::errors::Result;
use crate::handlers::parse_object_id;
use crate::models::{
    api::{ApiResponse, BenchUpdateRequest},
    team::Team,
};
use crate::services::roster::update_bench;
use crate::state::AppState;

/// PUT /api/teams/:id/bench
pub async fn update_team_bench(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BenchUpdateRequest>,
) -> Result<Json<ApiResponse<Team>>> {
    body.validate()?;
    let team_id = parse_object_id(&id, "team")?;
    let benched = body
        .legislator_ids
        .iter()
        .map(|raw| parse_object_id(raw, "legislator"))
        .collect::<Result<Vec<_>>>()?;

    let team = update_bench(state.store.as_ref(), &team_id, benched).await?;
    Ok(Json(ApiResponse::ok(team)))
}
