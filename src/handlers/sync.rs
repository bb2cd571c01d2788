use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{AppError, Result};
use crate::handlers::parse_object_id;
use crate::models::{
    api::{ApiResponse, RecalculateQuery},
    matchup::Matchup,
    sync::{SyncQuery, SyncTarget},
};
use crate::services::scheduler::MatchupScheduler;
use crate::state::AppState;

/// POST /api/cron/sync
pub async fn sync_all(
    State(state): State<AppState>,
    Query(query): Query<SyncQuery>,
) -> Result<(StatusCode, Json<Value>)> {
    info!("🔄 POST /api/cron/sync");
    let report = state.sync_service().run_all(&query).await?;

    if report.all_succeeded() {
        Ok((
            StatusCode::OK,
            Json(json!({ "success": true, "results": report.results })),
        ))
    } else {
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": report.failures().join("; "),
                "results": report.results,
            })),
        ))
    }
}

/// POST /api/cron/sync/:category
pub async fn sync_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<Value>> {
    let target = SyncTarget::parse(&category)
        .ok_or_else(|| AppError::invalid_data(format!("unknown sync category '{}'", category)))?;
    info!(category = %target, "🔄 POST /api/cron/sync/:category");

    let summary = state.sync_service().run(target, &query).await?;
    Ok(Json(json!({
        "success": true,
        "results": { target.as_str(): summary },
    })))
}

/// POST /api/cron/legislators
pub async fn sync_legislators(State(state): State<AppState>) -> Result<Json<Value>> {
    info!("🔄 POST /api/cron/legislators");
    let summary = state.sync_service().sync_legislators().await?;
    Ok(Json(json!({
        "success": true,
        "results": { "legislators": summary },
    })))
}

/// POST /api/cron/leagues/:id/week/:week
pub async fn calculate_week(
    State(state): State<AppState>,
    Path((league_id, week)): Path<(String, u32)>,
    Query(recalc): Query<RecalculateQuery>,
) -> Result<Json<ApiResponse<Vec<Matchup>>>> {
    let league_id = parse_object_id(&league_id, "league")?;
    if week == 0 {
        return Err(AppError::invalid_data("week numbers start at 1"));
    }
    let matchups = MatchupScheduler::new(state.store.as_ref())
        .calculate_week(&league_id, week, recalc.force)
        .await?;
    Ok(Json(ApiResponse::ok(matchups)))
}
