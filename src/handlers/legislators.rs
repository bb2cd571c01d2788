use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use validator::Validate;

use crate::errors::Result;
use crate::handlers::parse_object_id;
use crate::models::api::{ApiResponse, WeekQuery};
use crate::services::score_report::{weekly_breakdown, WeeklyBreakdown};
use crate::services::week_calendar::{current_week, today_local};
use crate::state::AppState;

/// GET /api/legislators/:id/scores?week=
///
/// Defaults to the current week (week 1 before the season starts).
pub async fn weekly_scores(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<ApiResponse<WeeklyBreakdown>>> {
    query.validate()?;
    let legislator_id = parse_object_id(&id, "legislator")?;
    let season_start = state.config.season_start;
    let week = query
        .week
        .unwrap_or_else(|| current_week(season_start, today_local()).max(1));

    let breakdown = weekly_breakdown(state.store.as_ref(), &legislator_id, season_start, week).await?;
    Ok(Json(ApiResponse::ok(breakdown)))
}
