// src/database/mongo.rs

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, ClientSession, Collection, Database, IndexModel,
};
use std::collections::HashMap;
use tracing::{info, warn};

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

const LEGISLATORS: &str = "legislators";
const SCORES: &str = "scores";
const LEAGUES: &str = "leagues";
const TEAMS: &str = "teams";
const MATCHUPS: &str = "matchups";
const DRAFT_PREFERENCES: &str = "draft_preferences";
const DRAFT_PICKS: &str = "draft_picks";

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    pub fn new(client: Client, db: Database) -> Self {
        MongoStore { client, db }
    }

    fn legislators(&self) -> Collection<Legislator> {
        self.db.collection(LEGISLATORS)
    }

    fn scores(&self) -> Collection<Score> {
        self.db.collection(SCORES)
    }

    fn leagues(&self) -> Collection<League> {
        self.db.collection(LEAGUES)
    }

    fn teams(&self) -> Collection<Team> {
        self.db.collection(TEAMS)
    }

    fn matchups(&self) -> Collection<Matchup> {
        self.db.collection(MATCHUPS)
    }

    fn preferences(&self) -> Collection<DraftPreference> {
        self.db.collection(DRAFT_PREFERENCES)
    }

    fn picks(&self) -> Collection<DraftPick> {
        self.db.collection(DRAFT_PICKS)
    }

    /// Unique index on the bill dedupe key, plus lookup indexes for the other
    /// two dedupe strategies and the weekly range scan.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let bill_key = IndexModel::builder()
            .keys(doc! { "legislatorId": 1, "billNumber": 1, "category": 1 })
            .options(
                IndexOptions::builder()
                    .name("uniq_bill_score".to_string())
                    .unique(true)
                    .partial_filter_expression(doc! { "billNumber": { "$exists": true } })
                    .build(),
            )
            .build();
        let event_key = IndexModel::builder()
            .keys(doc! { "legislatorId": 1, "category": 1, "date": 1 })
            .build();
        self.scores().create_indexes(vec![bill_key, event_key]).await?;

        let name_key = IndexModel::builder()
            .keys(doc! { "nameCh": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.legislators().create_index(name_key).await?;

        let matchup_key = IndexModel::builder()
            .keys(doc! { "leagueId": 1, "week": 1 })
            .build();
        self.matchups().create_index(matchup_key).await?;

        info!("✅ MongoDB indexes ensured");
        Ok(())
    }

    async fn run_in_transaction<F, Fut>(&self, op: F) -> Result<()>
    where
        F: FnOnce(ClientSession) -> Fut,
        Fut: std::future::Future<Output = (ClientSession, Result<()>)>,
    {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let (mut session, outcome) = op(session).await;
        match outcome {
            Ok(()) => {
                session.commit_transaction().await?;
                Ok(())
            }
            Err(e) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!("Failed to abort transaction: {}", abort_err);
                }
                Err(e)
            }
        }
    }
}

fn score_key_filter(key: &ScoreKey) -> Document {
    match key {
        ScoreKey::Bill {
            legislator_id,
            category,
            bill_number,
        } => doc! {
            "legislatorId": legislator_id,
            "category": category.as_str(),
            "billNumber": bill_number,
        },
        ScoreKey::ExactEvent {
            legislator_id,
            category,
            date,
            description,
        } => doc! {
            "legislatorId": legislator_id,
            "category": category.as_str(),
            "date": date,
            "description": description,
        },
        ScoreKey::WeekFingerprint {
            legislator_id,
            category,
            week_start,
            prefix,
        } => doc! {
            "legislatorId": legislator_id,
            "category": category.as_str(),
            "date": week_start,
            "description": { "$regex": format!("^{}", escape_regex(prefix)) },
        },
    }
}

fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\.+*?()|[]{}^$#&-~".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Profile fields the directory may drop between refreshes.
const CLEARABLE_PROFILE_FIELDS: [&str; 5] = ["externalId", "nameEn", "picUrl", "leaveDate", "leaveReason"];

/// `$set` the directory fields, `$unset` optional ones the feed no longer
/// carries, and leave the error flag alone.
fn legislator_upsert(legislator: &Legislator) -> Result<Document> {
    let mut fields = to_document(legislator)?;
    for preserved in ["_id", "errorFlag", "errorReason"] {
        fields.remove(preserved);
    }
    fields.insert("updatedAt", chrono::Utc::now().to_rfc3339());

    let mut cleared = Document::new();
    for field in CLEARABLE_PROFILE_FIELDS {
        if !fields.contains_key(field) {
            cleared.insert(field, "");
        }
    }

    let mut update = doc! { "$set": fields, "$setOnInsert": { "errorFlag": false } };
    if !cleared.is_empty() {
        update.insert("$unset", cleared);
    }
    Ok(update)
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document> {
    bson::to_document(value).map_err(|e| AppError::internal(format!("BSON encode failed: {}", e)))
}

#[async_trait]
impl Store for MongoStore {
    async fn list_legislators(&self, filter: &LegislatorFilter) -> Result<Vec<Legislator>> {
        let mut query = doc! {};
        if let Some(name) = &filter.name_contains {
            query.insert("nameCh", doc! { "$regex": escape_regex(name) });
        }

        let legislators = self.legislators();
        let mut find = legislators.find(query).sort(doc! { "nameCh": 1 });
        if let Some(offset) = filter.offset {
            find = find.skip(offset as u64);
        }
        if let Some(limit) = filter.limit {
            find = find.limit(limit as i64);
        }
        let cursor = find.await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_legislator(&self, id: &ObjectId) -> Result<Option<Legislator>> {
        Ok(self.legislators().find_one(doc! { "_id": id }).await?)
    }

    async fn upsert_legislator(&self, legislator: &Legislator) -> Result<Legislator> {
        let collection = self.legislators();
        collection
            .update_one(doc! { "nameCh": &legislator.name_ch }, legislator_upsert(legislator)?)
            .upsert(true)
            .await?;

        collection
            .find_one(doc! { "nameCh": &legislator.name_ch })
            .await?
            .ok_or_else(|| AppError::not_found("Legislator"))
    }

    async fn set_legislator_error(&self, id: &ObjectId, reason: Option<String>) -> Result<()> {
        let update = match reason {
            Some(reason) => doc! { "$set": { "errorFlag": true, "errorReason": reason } },
            None => doc! { "$set": { "errorFlag": false }, "$unset": { "errorReason": "" } },
        };
        self.legislators().update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn find_score(&self, key: &ScoreKey) -> Result<Option<Score>> {
        Ok(self.scores().find_one(score_key_filter(key)).await?)
    }

    async fn create_score(&self, mut score: Score) -> Result<Score> {
        score.created_at = Some(BsonDateTime::now());
        match self.scores().insert_one(&score).await {
            Ok(inserted) => {
                score.id = inserted.inserted_id.as_object_id();
                Ok(score)
            }
            Err(e) if is_duplicate_key(&e) => Err(AppError::DuplicateKey),
            Err(e) => Err(e.into()),
        }
    }

    async fn scores_for_legislators(
        &self,
        legislator_ids: &[ObjectId],
        from: BsonDateTime,
        to: BsonDateTime,
    ) -> Result<Vec<Score>> {
        if legislator_ids.is_empty() {
            return Ok(Vec::new());
        }
        let filter = doc! {
            "legislatorId": { "$in": legislator_ids.to_vec() },
            "date": { "$gte": from, "$lte": to },
        };
        let cursor = self.scores().find(filter).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_scores(&self, category: Option<ScoreCategory>) -> Result<u64> {
        let filter = match category {
            Some(category) => doc! { "category": category.as_str() },
            None => doc! {},
        };
        Ok(self.scores().count_documents(filter).await?)
    }

    async fn get_league(&self, id: &ObjectId) -> Result<Option<League>> {
        Ok(self.leagues().find_one(doc! { "_id": id }).await?)
    }

    async fn update_league_status(&self, id: &ObjectId, status: LeagueStatus) -> Result<()> {
        let status = bson::to_bson(&status)
            .map_err(|e| AppError::internal(format!("BSON encode failed: {}", e)))?;
        self.leagues()
            .update_one(doc! { "_id": id }, doc! { "$set": { "status": status } })
            .await?;
        Ok(())
    }

    async fn list_teams(&self, league_id: &ObjectId) -> Result<Vec<Team>> {
        let cursor = self
            .teams()
            .find(doc! { "leagueId": league_id })
            .sort(doc! { "_id": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_team(&self, id: &ObjectId) -> Result<Option<Team>> {
        Ok(self.teams().find_one(doc! { "_id": id }).await?)
    }

    async fn update_team_record(&self, id: &ObjectId, record: TeamRecord) -> Result<()> {
        self.teams()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "wins": record.wins as i64,
                    "losses": record.losses as i64,
                    "ties": record.ties as i64,
                } },
            )
            .await?;
        Ok(())
    }

    async fn set_team_bench(&self, id: &ObjectId, bench: &BenchSet) -> Result<()> {
        let ids: Vec<ObjectId> = bench.iter().copied().collect();
        self.teams()
            .update_one(doc! { "_id": id }, doc! { "$set": { "benchLegislatorIds": ids } })
            .await?;
        Ok(())
    }

    async fn replace_matchups(
        &self,
        league_id: &ObjectId,
        matchups: Vec<Matchup>,
    ) -> Result<Vec<Matchup>> {
        let created: Vec<Matchup> = matchups
            .into_iter()
            .map(|mut m| {
                m.id = Some(ObjectId::new());
                m
            })
            .collect();

        let collection = self.matchups();
        let league_id = *league_id;
        let to_insert = created.clone();
        self.run_in_transaction(|mut session| async move {
            let outcome = async {
                collection
                    .delete_many(doc! { "leagueId": league_id })
                    .session(&mut session)
                    .await?;
                if !to_insert.is_empty() {
                    collection.insert_many(&to_insert).session(&mut session).await?;
                }
                Ok::<(), AppError>(())
            }
            .await;
            (session, outcome)
        })
        .await?;

        Ok(created)
    }

    async fn list_matchups(&self, league_id: &ObjectId, week: Option<u32>) -> Result<Vec<Matchup>> {
        let mut filter = doc! { "leagueId": league_id };
        if let Some(week) = week {
            filter.insert("week", week as i64);
        }
        let cursor = self.matchups().find(filter).sort(doc! { "week": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_matchup(&self, id: &ObjectId) -> Result<Option<Matchup>> {
        Ok(self.matchups().find_one(doc! { "_id": id }).await?)
    }

    async fn set_matchup_result(&self, id: &ObjectId, result: MatchupResult) -> Result<()> {
        self.matchups()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "team1Score": result.team1_score,
                    "team2Score": result.team2_score,
                    "winnerId": result.winner_id,
                } },
            )
            .await?;
        Ok(())
    }

    async fn draft_preferences(&self, team_id: &ObjectId) -> Result<Vec<DraftPreference>> {
        let cursor = self
            .preferences()
            .find(doc! { "teamId": team_id })
            .sort(doc! { "rank": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn commit_draft(&self, league_id: &ObjectId, picks: Vec<DraftPick>) -> Result<()> {
        let mut rosters: HashMap<ObjectId, (Vec<ObjectId>, Vec<ObjectId>)> = HashMap::new();
        for pick in &picks {
            let entry = rosters.entry(pick.team_id).or_default();
            entry.0.push(pick.legislator_id);
            if pick.is_bench {
                entry.1.push(pick.legislator_id);
            }
        }

        let picks_collection = self.picks();
        let teams_collection = self.teams();
        let leagues_collection = self.leagues();
        let league_id = *league_id;
        let active = bson::to_bson(&LeagueStatus::Active)
            .map_err(|e| AppError::internal(format!("BSON encode failed: {}", e)))?;

        self.run_in_transaction(|mut session| async move {
            let outcome = async {
                picks_collection
                    .delete_many(doc! { "leagueId": league_id })
                    .session(&mut session)
                    .await?;
                if !picks.is_empty() {
                    picks_collection.insert_many(&picks).session(&mut session).await?;
                }
                for (team_id, (roster, bench)) in rosters {
                    teams_collection
                        .update_one(
                            doc! { "_id": team_id },
                            doc! { "$set": {
                                "legislatorIds": roster,
                                "benchLegislatorIds": bench,
                            } },
                        )
                        .session(&mut session)
                        .await?;
                }
                leagues_collection
                    .update_one(doc! { "_id": league_id }, doc! { "$set": { "status": active } })
                    .session(&mut session)
                    .await?;
                Ok::<(), AppError>(())
            }
            .await;
            (session, outcome)
        })
        .await
    }

    async fn list_draft_picks(&self, league_id: &ObjectId) -> Result<Vec<DraftPick>> {
        let cursor = self
            .picks()
            .find(doc! { "leagueId": league_id })
            .sort(doc! { "pickNumber": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn ping(&self) -> Result<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_metacharacters_are_escaped() {
        assert_eq!(escape_regex("a.b(c)"), "a\\.b\\(c\\)");
        assert_eq!(escape_regex("記名表決"), "記名表決");
    }

    #[test]
    fn week_key_filters_on_anchored_prefix() {
        let key = ScoreKey::WeekFingerprint {
            legislator_id: ObjectId::new(),
            category: ScoreCategory::RollcallVote,
            week_start: BsonDateTime::from_millis(0),
            prefix: "表決(一)".to_string(),
        };
        let filter = score_key_filter(&key);
        let description = filter.get_document("description").unwrap();
        assert_eq!(description.get_str("$regex").unwrap(), "^表決\\(一\\)");
        assert_eq!(filter.get_str("category").unwrap(), "ROLLCALL_VOTE");
    }

    #[test]
    fn returning_legislator_loses_stale_leave_fields() {
        let mut legislator = Legislator::new("王小明", "民進黨");
        legislator.pic_url = Some("https://example.org/1.jpg".to_string());
        let update = legislator_upsert(&legislator).unwrap();

        let set = update.get_document("$set").unwrap();
        assert!(!set.contains_key("errorFlag"));
        assert_eq!(set.get_bool("isLeave").unwrap(), false);

        let unset = update.get_document("$unset").unwrap();
        assert!(unset.contains_key("leaveDate"));
        assert!(unset.contains_key("leaveReason"));
        assert!(!unset.contains_key("picUrl"));
    }

    #[test]
    fn legislator_on_leave_keeps_leave_fields_set() {
        let mut legislator = Legislator::new("李大華", "國民黨");
        legislator.is_leave = true;
        legislator.leave_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 1);
        legislator.leave_reason = Some("辭職".to_string());
        let update = legislator_upsert(&legislator).unwrap();

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("leaveReason").unwrap(), "辭職");
        let unset = update.get_document("$unset").unwrap();
        assert!(!unset.contains_key("leaveDate"));
        assert!(!unset.contains_key("leaveReason"));
    }
}
