// src/database/store.rs
//! The record store every component receives explicitly.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime as BsonDateTime};

use crate::errors::Result;
use crate::models::{
    draft::{DraftPick, DraftPreference},
    league::{League, LeagueStatus},
    legislator::{Legislator, LegislatorFilter},
    matchup::{Matchup, MatchupResult},
    score::{Score, ScoreCategory, ScoreKey},
    team::{BenchSet, Team, TeamRecord},
};

#[async_trait]
pub trait Store: Send + Sync {
    // ========== LEGISLATORS ==========

    /// Ordered by Chinese name so `limit`/`offset` pages are stable.
    async fn list_legislators(&self, filter: &LegislatorFilter) -> Result<Vec<Legislator>>;

    async fn get_legislator(&self, id: &ObjectId) -> Result<Option<Legislator>>;

    /// Inserts or updates by Chinese name. Error flags on an existing record
    /// are left alone.
    async fn upsert_legislator(&self, legislator: &Legislator) -> Result<Legislator>;

    /// `Some(reason)` raises the error flag, `None` clears it.
    async fn set_legislator_error(&self, id: &ObjectId, reason: Option<String>) -> Result<()>;

    // ========== SCORES ==========

    async fn find_score(&self, key: &ScoreKey) -> Result<Option<Score>>;

    async fn create_score(&self, score: Score) -> Result<Score>;

    /// Scores of `legislator_ids` dated within `[from, to]`.
    async fn scores_for_legislators(
        &self,
        legislator_ids: &[ObjectId],
        from: BsonDateTime,
        to: BsonDateTime,
    ) -> Result<Vec<Score>>;

    async fn count_scores(&self, category: Option<ScoreCategory>) -> Result<u64>;

    // ========== LEAGUES & TEAMS ==========

    async fn get_league(&self, id: &ObjectId) -> Result<Option<League>>;

    async fn update_league_status(&self, id: &ObjectId, status: LeagueStatus) -> Result<()>;

    /// Teams of a league in creation order.
    async fn list_teams(&self, league_id: &ObjectId) -> Result<Vec<Team>>;

    async fn get_team(&self, id: &ObjectId) -> Result<Option<Team>>;

    async fn update_team_record(&self, id: &ObjectId, record: TeamRecord) -> Result<()>;

    async fn set_team_bench(&self, id: &ObjectId, bench: &BenchSet) -> Result<()>;

    // ========== MATCHUPS ==========

    /// Deletes every matchup of the league and inserts `matchups`, all or
    /// nothing.
    async fn replace_matchups(
        &self,
        league_id: &ObjectId,
        matchups: Vec<Matchup>,
    ) -> Result<Vec<Matchup>>;

    /// Ordered by week.
    async fn list_matchups(&self, league_id: &ObjectId, week: Option<u32>) -> Result<Vec<Matchup>>;

    async fn get_matchup(&self, id: &ObjectId) -> Result<Option<Matchup>>;

    async fn set_matchup_result(&self, id: &ObjectId, result: MatchupResult) -> Result<()>;

    // ========== DRAFT ==========

    /// Ordered by rank, best first.
    async fn draft_preferences(&self, team_id: &ObjectId) -> Result<Vec<DraftPreference>>;

    /// Records the picks, assigns rosters and benches, and marks the league
    /// active, all or nothing.
    async fn commit_draft(&self, league_id: &ObjectId, picks: Vec<DraftPick>) -> Result<()>;

    async fn list_draft_picks(&self, league_id: &ObjectId) -> Result<Vec<DraftPick>>;

    async fn ping(&self) -> Result<()>;
}
