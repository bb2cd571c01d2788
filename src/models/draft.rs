use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const STARTER_ROUNDS: u32 = 6;
pub const BENCH_ROUNDS: u32 = 3;
pub const TOTAL_ROUNDS: u32 = STARTER_ROUNDS + BENCH_ROUNDS;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftPreference {
    #[serde(rename = "teamId")]
    pub team_id: ObjectId,

    #[serde(rename = "legislatorId")]
    pub legislator_id: ObjectId,

    /// 1 is the most wanted.
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftPick {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "leagueId")]
    pub league_id: ObjectId,

    #[serde(rename = "teamId")]
    pub team_id: ObjectId,

    #[serde(rename = "legislatorId")]
    pub legislator_id: ObjectId,

    pub round: u32,

    /// 1-based across the whole draft.
    #[serde(rename = "pickNumber")]
    pub pick_number: u32,

    #[serde(rename = "isBench")]
    pub is_bench: bool,

    /// True when the queue was empty and the pick was random.
    #[serde(rename = "autoPicked", default)]
    pub auto_picked: bool,
}
