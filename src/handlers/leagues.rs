use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::HashMap;
use validator::Validate;

use crate::errors::Result;
use crate::handlers::parse_object_id;
use crate::models::{
    api::{ApiResponse, WeekQuery},
    matchup::{Matchup, StandingRow},
    team::TeamRecord,
};
use crate::services::{
    draft::{DraftOutcome, DraftRunner},
    scheduler::MatchupScheduler,
};
use crate::state::AppState;

/// POST /api/leagues/:id/schedule
pub async fn generate_schedule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Matchup>>>> {
    let league_id = parse_object_id(&id, "league")?;
    let matchups = MatchupScheduler::new(state.store.as_ref())
        .generate_schedule(&league_id)
        .await?;
    Ok(Json(ApiResponse::ok(matchups)))
}

/// GET /api/leagues/:id/matchups?week=
pub async fn list_matchups(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ApiResponse<Vec<Matchup>>>> {
    query.validate()?;
    let league_id = parse_object_id(&id, "league")?;
    let matchups = state.store.list_matchups(&league_id, query.week).await?;
    Ok(Json(ApiResponse::ok(matchups)))
}

/// POST /api/leagues/:id/draft
pub async fn run_draft(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DraftOutcome>>> {
    let league_id = parse_object_id(&id, "league")?;
    let mut rng = StdRng::from_entropy();
    let outcome = DraftRunner::new(state.store.as_ref())
        .run(&league_id, &mut rng)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// POST /api/leagues/:id/records
pub async fn update_records(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<HashMap<String, TeamRecord>>>> {
    let league_id = parse_object_id(&id, "league")?;
    let records = MatchupScheduler::new(state.store.as_ref())
        .update_team_records(&league_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        records
            .into_iter()
            .map(|(team_id, record)| (team_id.to_hex(), record))
            .collect(),
    )))
}

/// GET /api/leagues/:id/standings
pub async fn standings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<StandingRow>>>> {
    let league_id = parse_object_id(&id, "league")?;
    let rows = MatchupScheduler::new(state.store.as_ref())
        .standings(&league_id)
        .await?;
    Ok(Json(ApiResponse::ok(rows)))
}
