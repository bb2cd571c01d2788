// src/models/sync.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::score::ScoreCategory;

/// A source record mapped into our vocabulary, ready to become a `Score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub category: ScoreCategory,
    /// Taipei calendar day of the activity. `None` means the source gave no
    /// usable date and the record is skipped.
    pub date: Option<NaiveDate>,
    pub points: f64,
    pub description: String,
    pub bill_number: Option<String>,
    pub bill_title: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Aggregate statistics of one sync run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SyncSummary {
    #[serde(rename = "processedCount")]
    pub processed_count: u32,

    #[serde(rename = "errorCount")]
    pub error_count: u32,

    #[serde(rename = "totalScoresCreated")]
    pub total_scores_created: u32,

    pub errors: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Which legislators a run covers, and the activity window for
/// date-ranged feeds.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SyncQuery {
    /// Only this legislator (substring match on the Chinese name).
    pub legislator: Option<String>,

    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub limit: Option<usize>,

    pub offset: Option<usize>,

    /// Inclusive window start for speeches / roll-calls (YYYY-MM-DD).
    pub from: Option<NaiveDate>,

    /// Inclusive window end (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// Categories that can be triggered on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTarget {
    Proposals,
    Cosigns,
    Interpellations,
    Speeches,
    Rollcalls,
}

impl SyncTarget {
    pub const ALL: [SyncTarget; 5] = [
        SyncTarget::Proposals,
        SyncTarget::Cosigns,
        SyncTarget::Interpellations,
        SyncTarget::Speeches,
        SyncTarget::Rollcalls,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncTarget::Proposals => "proposals",
            SyncTarget::Cosigns => "cosigns",
            SyncTarget::Interpellations => "interpellations",
            SyncTarget::Speeches => "speeches",
            SyncTarget::Rollcalls => "rollcalls",
        }
    }

    pub fn parse(raw: &str) -> Option<SyncTarget> {
        SyncTarget::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_parse_case_insensitively() {
        assert_eq!(SyncTarget::parse("Rollcalls"), Some(SyncTarget::Rollcalls));
        assert_eq!(SyncTarget::parse(" speeches "), Some(SyncTarget::Speeches));
        assert_eq!(SyncTarget::parse("votes"), None);
    }

    #[test]
    fn limit_is_validated() {
        let query = SyncQuery {
            limit: Some(0),
            ..SyncQuery::default()
        };
        assert!(query.validate().is_err());
        let query = SyncQuery {
            limit: Some(20),
            offset: Some(40),
            ..SyncQuery::default()
        };
        assert!(query.validate().is_ok());
    }
}
