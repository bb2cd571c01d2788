use bson::oid::ObjectId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeagueStatus {
    Pending,
    Drafting,
    Active,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct League {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    pub name: String,

    pub status: LeagueStatus,

    #[serde(rename = "seasonStart")]
    pub season_start: NaiveDate,

    #[serde(rename = "totalWeeks")]
    pub total_weeks: u32,
}

impl League {
    pub fn new(name: impl Into<String>, season_start: NaiveDate, total_weeks: u32) -> Self {
        League {
            id: None,
            name: name.into(),
            status: LeagueStatus::Pending,
            season_start,
            total_weeks,
        }
    }
}
