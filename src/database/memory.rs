// src/database/memory.rs
//! In-process store. Backs the integration tests and local dry runs.

use async_trait::async_trait;
use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::store::Store;
use crate::errors::{AppError, Result};
use crate::models::{
    draft::{DraftPick, DraftPreference},
    league::{League, LeagueStatus},
    legislator::{Legislator, LegislatorFilter},
    matchup::{Matchup, MatchupResult},
    score::{Score, ScoreCategory, ScoreKey},
    team::{BenchSet, Team, TeamRecord},
};

#[derive(Default)]
struct Inner {
    legislators: Vec<Legislator>,
    scores: Vec<Score>,
    leagues: Vec<League>,
    teams: Vec<Team>,
    matchups: Vec<Matchup>,
    preferences: Vec<DraftPreference>,
    picks: Vec<DraftPick>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_legislator(&self, mut legislator: Legislator) -> Legislator {
        legislator.id.get_or_insert_with(ObjectId::new);
        self.inner.write().await.legislators.push(legislator.clone());
        legislator
    }

    pub async fn insert_league(&self, mut league: League) -> League {
        league.id.get_or_insert_with(ObjectId::new);
        self.inner.write().await.leagues.push(league.clone());
        league
    }

    pub async fn insert_team(&self, mut team: Team) -> Team {
        team.id.get_or_insert_with(ObjectId::new);
        self.inner.write().await.teams.push(team.clone());
        team
    }

    pub async fn insert_preference(&self, preference: DraftPreference) {
        self.inner.write().await.preferences.push(preference);
    }

    pub async fn all_scores(&self) -> Vec<Score> {
        self.inner.read().await.scores.clone()
    }

    pub async fn all_matchups(&self) -> Vec<Matchup> {
        self.inner.read().await.matchups.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_legislators(&self, filter: &LegislatorFilter) -> Result<Vec<Legislator>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Legislator> = inner
            .legislators
            .iter()
            .filter(|l| match &filter.name_contains {
                Some(name) => l.name_ch.contains(name.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name_ch.cmp(&b.name_ch));

        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(usize::MAX);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }

    async fn get_legislator(&self, id: &ObjectId) -> Result<Option<Legislator>> {
        let inner = self.inner.read().await;
        Ok(inner.legislators.iter().find(|l| l.id.as_ref() == Some(id)).cloned())
    }

    async fn upsert_legislator(&self, legislator: &Legislator) -> Result<Legislator> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner
            .legislators
            .iter_mut()
            .find(|l| l.name_ch == legislator.name_ch)
        {
            let keep_id = existing.id;
            let keep_error = (existing.error_flag, existing.error_reason.clone());
            *existing = legislator.clone();
            existing.id = keep_id;
            existing.error_flag = keep_error.0;
            existing.error_reason = keep_error.1;
            existing.updated_at = Some(Utc::now());
            return Ok(existing.clone());
        }

        let mut created = legislator.clone();
        created.id = Some(ObjectId::new());
        created.updated_at = Some(Utc::now());
        inner.legislators.push(created.clone());
        Ok(created)
    }

    async fn set_legislator_error(&self, id: &ObjectId, reason: Option<String>) -> Result<()> {
        let mut inner = self.inner.write().await;
        let legislator = inner
            .legislators
            .iter_mut()
            .find(|l| l.id.as_ref() == Some(id))
            .ok_or_else(|| AppError::not_found("Legislator"))?;
        legislator.error_flag = reason.is_some();
        legislator.error_reason = reason;
        Ok(())
    }

    async fn find_score(&self, key: &ScoreKey) -> Result<Option<Score>> {
        let inner = self.inner.read().await;
        Ok(inner.scores.iter().find(|s| key.matches(s)).cloned())
    }

    async fn create_score(&self, mut score: Score) -> Result<Score> {
        let mut inner = self.inner.write().await;
        // Mirrors the unique index on the bill key in MongoDB.
        let key = score.dedupe_key();
        if matches!(key, ScoreKey::Bill { .. }) && inner.scores.iter().any(|s| key.matches(s)) {
            return Err(AppError::DuplicateKey);
        }
        score.id = Some(ObjectId::new());
        score.created_at = Some(BsonDateTime::now());
        inner.scores.push(score.clone());
        Ok(score)
    }

    async fn scores_for_legislators(
        &self,
        legislator_ids: &[ObjectId],
        from: BsonDateTime,
        to: BsonDateTime,
    ) -> Result<Vec<Score>> {
        let inner = self.inner.read().await;
        Ok(inner
            .scores
            .iter()
            .filter(|s| legislator_ids.contains(&s.legislator_id))
            .filter(|s| s.date >= from && s.date <= to)
            .cloned()
            .collect())
    }

    async fn count_scores(&self, category: Option<ScoreCategory>) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner
            .scores
            .iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .count() as u64)
    }

    async fn get_league(&self, id: &ObjectId) -> Result<Option<League>> {
        let inner = self.inner.read().await;
        Ok(inner.leagues.iter().find(|l| l.id.as_ref() == Some(id)).cloned())
    }

    async fn update_league_status(&self, id: &ObjectId, status: LeagueStatus) -> Result<()> {
        let mut inner = self.inner.write().await;
        let league = inner
            .leagues
            .iter_mut()
            .find(|l| l.id.as_ref() == Some(id))
            .ok_or_else(|| AppError::not_found("League"))?;
        league.status = status;
        Ok(())
    }

    async fn list_teams(&self, league_id: &ObjectId) -> Result<Vec<Team>> {
        let inner = self.inner.read().await;
        Ok(inner
            .teams
            .iter()
            .filter(|t| t.league_id == *league_id)
            .cloned()
            .collect())
    }

    async fn get_team(&self, id: &ObjectId) -> Result<Option<Team>> {
        let inner = self.inner.read().await;
        Ok(inner.teams.iter().find(|t| t.id.as_ref() == Some(id)).cloned())
    }

    async fn update_team_record(&self, id: &ObjectId, record: TeamRecord) -> Result<()> {
        let mut inner = self.inner.write().await;
        let team = inner
            .teams
            .iter_mut()
            .find(|t| t.id.as_ref() == Some(id))
            .ok_or_else(|| AppError::not_found("Team"))?;
        team.wins = record.wins;
        team.losses = record.losses;
        team.ties = record.ties;
        Ok(())
    }

    async fn set_team_bench(&self, id: &ObjectId, bench: &BenchSet) -> Result<()> {
        let mut inner = self.inner.write().await;
        let team = inner
            .teams
            .iter_mut()
            .find(|t| t.id.as_ref() == Some(id))
            .ok_or_else(|| AppError::not_found("Team"))?;
        team.bench = bench.clone();
        Ok(())
    }

    async fn replace_matchups(
        &self,
        league_id: &ObjectId,
        matchups: Vec<Matchup>,
    ) -> Result<Vec<Matchup>> {
        let mut inner = self.inner.write().await;
        inner.matchups.retain(|m| m.league_id != *league_id);
        let created: Vec<Matchup> = matchups
            .into_iter()
            .map(|mut m| {
                m.id = Some(ObjectId::new());
                m
            })
            .collect();
        inner.matchups.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list_matchups(&self, league_id: &ObjectId, week: Option<u32>) -> Result<Vec<Matchup>> {
        let inner = self.inner.read().await;
        let mut found: Vec<Matchup> = inner
            .matchups
            .iter()
            .filter(|m| m.league_id == *league_id)
            .filter(|m| week.map_or(true, |w| m.week == w))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.week);
        Ok(found)
    }

    async fn get_matchup(&self, id: &ObjectId) -> Result<Option<Matchup>> {
        let inner = self.inner.read().await;
        Ok(inner.matchups.iter().find(|m| m.id.as_ref() == Some(id)).cloned())
    }

    async fn set_matchup_result(&self, id: &ObjectId, result: MatchupResult) -> Result<()> {
        let mut inner = self.inner.write().await;
        let matchup = inner
            .matchups
            .iter_mut()
            .find(|m| m.id.as_ref() == Some(id))
            .ok_or_else(|| AppError::not_found("Matchup"))?;
        matchup.team1_score = Some(result.team1_score);
        matchup.team2_score = result.team2_score;
        matchup.winner_id = result.winner_id;
        Ok(())
    }

    async fn draft_preferences(&self, team_id: &ObjectId) -> Result<Vec<DraftPreference>> {
        let inner = self.inner.read().await;
        let mut found: Vec<DraftPreference> = inner
            .preferences
            .iter()
            .filter(|p| p.team_id == *team_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.rank);
        Ok(found)
    }

    async fn commit_draft(&self, league_id: &ObjectId, picks: Vec<DraftPick>) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.leagues.iter().any(|l| l.id.as_ref() == Some(league_id)) {
            return Err(AppError::not_found("League"));
        }

        let mut rosters: HashMap<ObjectId, (Vec<ObjectId>, BenchSet)> = HashMap::new();
        for pick in &picks {
            let entry = rosters.entry(pick.team_id).or_default();
            entry.0.push(pick.legislator_id);
            if pick.is_bench {
                entry.1.insert(pick.legislator_id);
            }
        }

        for team in inner.teams.iter_mut().filter(|t| t.league_id == *league_id) {
            let (roster, bench) = team
                .id
                .and_then(|id| rosters.remove(&id))
                .unwrap_or_default();
            team.legislator_ids = roster;
            team.bench = bench;
        }

        inner.picks.retain(|p| p.league_id != *league_id);
        inner.picks.extend(picks.into_iter().map(|mut p| {
            p.id = Some(ObjectId::new());
            p
        }));

        if let Some(league) = inner.leagues.iter_mut().find(|l| l.id.as_ref() == Some(league_id)) {
            league.status = LeagueStatus::Active;
        }
        Ok(())
    }

    async fn list_draft_picks(&self, league_id: &ObjectId) -> Result<Vec<DraftPick>> {
        let inner = self.inner.read().await;
        let mut found: Vec<DraftPick> = inner
            .picks
            .iter()
            .filter(|p| p.league_id == *league_id)
            .cloned()
            .collect();
        found.sort_by_key(|p| p.pick_number);
        Ok(found)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
