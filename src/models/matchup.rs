use bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Matchup {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "leagueId")]
    pub league_id: ObjectId,

    /// 1-based.
    pub week: u32,

    #[serde(rename = "weekStart")]
    pub week_start: BsonDateTime,

    #[serde(rename = "team1Id")]
    pub team1_id: ObjectId,

    /// `None` is a bye.
    #[serde(rename = "team2Id")]
    pub team2_id: Option<ObjectId>,

    #[serde(rename = "team1Score")]
    pub team1_score: Option<f64>,

    #[serde(rename = "team2Score")]
    pub team2_score: Option<f64>,

    /// `None` after scoring means a tie.
    #[serde(rename = "winnerId")]
    pub winner_id: Option<ObjectId>,
}

impl Matchup {
    pub fn is_bye(&self) -> bool {
        self.team2_id.is_none()
    }

    /// A result exists once `team1_score` has been filled in.
    pub fn is_scored(&self) -> bool {
        self.team1_score.is_some()
    }

    pub fn involves(&self, team_id: &ObjectId) -> bool {
        self.team1_id == *team_id || self.team2_id.as_ref() == Some(team_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchupResult {
    pub team1_score: f64,
    pub team2_score: Option<f64>,
    pub winner_id: Option<ObjectId>,
}

/// One row of the standings table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StandingRow {
    #[serde(rename = "teamId")]
    pub team_id: ObjectId,
    #[serde(rename = "teamName")]
    pub team_name: String,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    #[serde(rename = "pointsFor")]
    pub points_for: f64,
}
