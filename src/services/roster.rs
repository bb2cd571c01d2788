// src/services/roster.rs

use bson::oid::ObjectId;
use tracing::info;

use crate::database::Store;
use crate::errors::{AppError, Result};
use crate::models::team::{BenchSet, Team};

/// Replaces a team's bench. Every benched legislator must be on the roster.
/// Matchups that already have a result keep it; the new bench applies to
/// weeks scored from now on.
pub async fn update_bench(store: &dyn Store, team_id: &ObjectId, benched: Vec<ObjectId>) -> Result<Team> {
    let mut team = store
        .get_team(team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team"))?;

    let bench: BenchSet = benched.into_iter().collect();
    if let Some(stranger) = bench.iter().find(|id| !team.legislator_ids.contains(id)) {
        return Err(AppError::ValidationError(format!(
            "legislator {} is not on team {}'s roster",
            stranger, team.name
        )));
    }

    store.set_team_bench(team_id, &bench).await?;
    info!(team = %team.name, benched = bench.len(), "Bench updated");
    team.bench = bench;
    Ok(team)
}
