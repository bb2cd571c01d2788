// src/services/scheduler.rs
//! Round-robin schedule, weekly matchup scoring, records and standings.

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::database::Store;
use crate::errors::{AppError, Result};
use crate::models::{
    league::League,
    matchup::{Matchup, MatchupResult, StandingRow},
    team::{Team, TeamRecord},
};
use crate::services::week_calendar::{week_date_range, WeekRange};

/// Pairings for `total_weeks` weeks using the circle method. A bye is
/// `(team, None)`. With an odd team count every team gets exactly one bye
/// per cycle. The cycle (`n` weeks for odd `n`, `n - 1` for even) repeats
/// until the season is filled.
pub fn round_robin<T: Clone>(teams: &[T], total_weeks: u32) -> Vec<Vec<(T, Option<T>)>> {
    if teams.is_empty() || total_weeks == 0 {
        return Vec::new();
    }

    let mut slots: Vec<Option<T>> = teams.iter().cloned().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();

    let mut cycle = Vec::with_capacity(n - 1);
    for _ in 0..n - 1 {
        let week: Vec<(T, Option<T>)> = (0..n / 2)
            .filter_map(|i| match (&slots[i], &slots[n - 1 - i]) {
                (Some(a), b) => Some((a.clone(), b.clone())),
                (None, Some(b)) => Some((b.clone(), None)),
                (None, None) => None,
            })
            .collect();
        cycle.push(week);
        // Slot 0 stays put, everyone else moves one seat.
        slots[1..].rotate_right(1);
    }

    (0..total_weeks as usize)
        .map(|week| cycle[week % cycle.len()].clone())
        .collect()
}

pub struct MatchupScheduler<'a> {
    store: &'a dyn Store,
}

impl<'a> MatchupScheduler<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        MatchupScheduler { store }
    }

    async fn league(&self, league_id: &ObjectId) -> Result<League> {
        self.store
            .get_league(league_id)
            .await?
            .ok_or_else(|| AppError::not_found("League"))
    }

    async fn team(&self, team_id: &ObjectId) -> Result<Team> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team"))
    }

    /// Deletes the league's matchups and writes a fresh schedule.
    pub async fn generate_schedule(&self, league_id: &ObjectId) -> Result<Vec<Matchup>> {
        let league = self.league(league_id).await?;
        let teams = self.store.list_teams(league_id).await?;

        if teams.len() < 2 {
            return Err(AppError::ValidationError(
                "a schedule needs at least two teams".to_string(),
            ));
        }
        if league.total_weeks == 0 {
            return Err(AppError::ValidationError(
                "league has no weeks to schedule".to_string(),
            ));
        }

        let team_ids: Vec<ObjectId> = teams.iter().filter_map(|t| t.id).collect();
        let weeks = round_robin(&team_ids, league.total_weeks);

        let mut matchups = Vec::new();
        for (index, pairs) in weeks.into_iter().enumerate() {
            let week = index as u32 + 1;
            let (start, _) = week_date_range(league.season_start, week).to_utc();
            for (team1_id, team2_id) in pairs {
                matchups.push(Matchup {
                    id: None,
                    league_id: *league_id,
                    week,
                    week_start: BsonDateTime::from_chrono(start),
                    team1_id,
                    team2_id,
                    team1_score: None,
                    team2_score: None,
                    winner_id: None,
                });
            }
        }

        let created = self.store.replace_matchups(league_id, matchups).await?;
        info!(
            league = %league.name,
            teams = team_ids.len(),
            weeks = league.total_weeks,
            matchups = created.len(),
            "📅 Schedule generated"
        );
        Ok(created)
    }

    /// Sum of the active roster's points inside `range`.
    pub async fn team_week_score(&self, team: &Team, range: &WeekRange) -> Result<f64> {
        let active = team.active_legislator_ids();
        if active.is_empty() {
            return Ok(0.0);
        }
        let (from, to) = range.to_utc();
        let scores = self
            .store
            .scores_for_legislators(
                &active,
                BsonDateTime::from_chrono(from),
                BsonDateTime::from_chrono(to),
            )
            .await?;
        Ok(scores.iter().map(|s| s.points).sum())
    }

    /// Scores one matchup from its teams' current active rosters. A matchup
    /// that already has a result is returned as stored unless `force` is set,
    /// so later bench moves never rewrite a finished week.
    pub async fn calculate_matchup(&self, matchup_id: &ObjectId, force: bool) -> Result<Matchup> {
        let mut matchup = self
            .store
            .get_matchup(matchup_id)
            .await?
            .ok_or_else(|| AppError::not_found("Matchup"))?;
        if matchup.is_scored() && !force {
            debug!(matchup = %matchup_id, week = matchup.week, "Matchup already scored, keeping result");
            return Ok(matchup);
        }
        let league = self.league(&matchup.league_id).await?;
        let range = week_date_range(league.season_start, matchup.week);

        let team1 = self.team(&matchup.team1_id).await?;
        let team1_score = self.team_week_score(&team1, &range).await?;

        let result = match matchup.team2_id {
            None => MatchupResult {
                team1_score,
                team2_score: None,
                winner_id: Some(matchup.team1_id),
            },
            Some(team2_id) => {
                let team2 = self.team(&team2_id).await?;
                let team2_score = self.team_week_score(&team2, &range).await?;
                MatchupResult {
                    team1_score,
                    team2_score: Some(team2_score),
                    winner_id: decide_winner(matchup.team1_id, team1_score, team2_id, team2_score),
                }
            }
        };

        self.store.set_matchup_result(matchup_id, result).await?;
        debug!(
            matchup = %matchup_id,
            week = matchup.week,
            team1_score = result.team1_score,
            team2_score = ?result.team2_score,
            "Matchup scored"
        );

        matchup.team1_score = Some(result.team1_score);
        matchup.team2_score = result.team2_score;
        matchup.winner_id = result.winner_id;
        Ok(matchup)
    }

    /// Scores every matchup of `week`, then recomputes the league's records.
    /// `force` rescores matchups that already have a result.
    pub async fn calculate_week(&self, league_id: &ObjectId, week: u32, force: bool) -> Result<Vec<Matchup>> {
        let matchups = self.store.list_matchups(league_id, Some(week)).await?;
        if matchups.is_empty() {
            return Err(AppError::not_found(format!("Matchups for week {}", week)));
        }

        let mut scored = Vec::with_capacity(matchups.len());
        for matchup in &matchups {
            if let Some(id) = matchup.id {
                scored.push(self.calculate_matchup(&id, force).await?);
            }
        }

        self.update_team_records(league_id).await?;
        info!(league = %league_id, week, force, matchups = scored.len(), "✅ Week calculated");
        Ok(scored)
    }

    /// Full recompute from every scored matchup; safe to repeat.
    pub async fn update_team_records(&self, league_id: &ObjectId) -> Result<HashMap<ObjectId, TeamRecord>> {
        let teams = self.store.list_teams(league_id).await?;
        let matchups = self.store.list_matchups(league_id, None).await?;
        let records = tally_records(&teams, &matchups);

        for (team_id, record) in &records {
            self.store.update_team_record(team_id, *record).await?;
        }
        debug!(league = %league_id, teams = records.len(), "Team records recomputed");
        Ok(records)
    }

    pub async fn standings(&self, league_id: &ObjectId) -> Result<Vec<StandingRow>> {
        let teams = self.store.list_teams(league_id).await?;
        let matchups = self.store.list_matchups(league_id, None).await?;
        Ok(build_standings(&teams, &matchups))
    }
}

/// Higher score wins; an exact tie has no winner.
pub fn decide_winner(
    team1_id: ObjectId,
    team1_score: f64,
    team2_id: ObjectId,
    team2_score: f64,
) -> Option<ObjectId> {
    match team1_score.partial_cmp(&team2_score) {
        Some(Ordering::Greater) => Some(team1_id),
        Some(Ordering::Less) => Some(team2_id),
        _ => None,
    }
}

pub fn tally_records(teams: &[Team], matchups: &[Matchup]) -> HashMap<ObjectId, TeamRecord> {
    let mut records: HashMap<ObjectId, TeamRecord> = teams
        .iter()
        .filter_map(|t| t.id)
        .map(|id| (id, TeamRecord::default()))
        .collect();

    for matchup in matchups.iter().filter(|m| m.is_scored()) {
        match (matchup.team2_id, matchup.winner_id) {
            (None, _) => {
                if let Some(r) = records.get_mut(&matchup.team1_id) {
                    r.wins += 1;
                }
            }
            (Some(team2_id), Some(winner)) => {
                let loser = if winner == matchup.team1_id {
                    team2_id
                } else {
                    matchup.team1_id
                };
                if let Some(r) = records.get_mut(&winner) {
                    r.wins += 1;
                }
                if let Some(r) = records.get_mut(&loser) {
                    r.losses += 1;
                }
            }
            (Some(team2_id), None) => {
                for id in [matchup.team1_id, team2_id] {
                    if let Some(r) = records.get_mut(&id) {
                        r.ties += 1;
                    }
                }
            }
        }
    }
    records
}

/// Wins desc, ties desc, losses asc, points-for desc.
pub fn build_standings(teams: &[Team], matchups: &[Matchup]) -> Vec<StandingRow> {
    let mut points: HashMap<ObjectId, f64> = HashMap::new();
    for matchup in matchups.iter().filter(|m| m.is_scored()) {
        *points.entry(matchup.team1_id).or_default() += matchup.team1_score.unwrap_or(0.0);
        if let (Some(team2_id), Some(score)) = (matchup.team2_id, matchup.team2_score) {
            *points.entry(team2_id).or_default() += score;
        }
    }

    let mut rows: Vec<StandingRow> = teams
        .iter()
        .filter_map(|team| {
            let id = team.id?;
            Some(StandingRow {
                team_id: id,
                team_name: team.name.clone(),
                wins: team.wins,
                losses: team.losses,
                ties: team.ties,
                points_for: points.get(&id).copied().unwrap_or(0.0),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.ties.cmp(&a.ties))
            .then(a.losses.cmp(&b.losses))
            .then(b.points_for.partial_cmp(&a.points_for).unwrap_or(Ordering::Equal))
    });
    rows
}
