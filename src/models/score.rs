// src/models/score.rs

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ========== POINT TABLE ==========

pub const PROPOSE_BILL_BASE_POINTS: f64 = 3.0;
pub const PROPOSE_BILL_PASSED_BONUS: f64 = 6.0;
/// Cosignatures only score once the bill has passed.
pub const COSIGN_BILL_PASSED_POINTS: f64 = 3.0;
pub const WRITTEN_INTERPELLATION_POINTS: f64 = 3.0;
pub const FLOOR_SPEECH_POINTS: f64 = 1.0;
pub const ROLLCALL_VOTE_POINTS: f64 = 1.0;

/// Length of the description prefix used to tell apart several roll-call
/// events that land in the same week.
pub const FINGERPRINT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreCategory {
    ProposeBill,
    CosignBill,
    FloorSpeech,
    WrittenInterpellation,
    RollcallVote,
    MaverickBonus,
    /// Simulated history loaded by seed scripts. Never produced by a sync.
    #[serde(other)]
    Legacy,
}

/// How a category decides whether a fact was already recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeStrategy {
    /// (legislator, bill number, category)
    Bill,
    /// (legislator, category, date, exact description)
    ExactEvent,
    /// (legislator, category, week start, description prefix)
    WeekFingerprint,
}

impl ScoreCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreCategory::ProposeBill => "PROPOSE_BILL",
            ScoreCategory::CosignBill => "COSIGN_BILL",
            ScoreCategory::FloorSpeech => "FLOOR_SPEECH",
            ScoreCategory::WrittenInterpellation => "WRITTEN_INTERPELLATION",
            ScoreCategory::RollcallVote => "ROLLCALL_VOTE",
            ScoreCategory::MaverickBonus => "MAVERICK_BONUS",
            ScoreCategory::Legacy => "LEGACY",
        }
    }

    pub fn dedupe_strategy(&self) -> DedupeStrategy {
        match self {
            ScoreCategory::ProposeBill | ScoreCategory::CosignBill => DedupeStrategy::Bill,
            ScoreCategory::FloorSpeech
            | ScoreCategory::WrittenInterpellation
            | ScoreCategory::Legacy => DedupeStrategy::ExactEvent,
            ScoreCategory::RollcallVote | ScoreCategory::MaverickBonus => {
                DedupeStrategy::WeekFingerprint
            }
        }
    }

    /// Whether the stored date is the Monday of the activity's week rather
    /// than the activity day itself.
    pub fn is_week_based(&self) -> bool {
        self.dedupe_strategy() == DedupeStrategy::WeekFingerprint
    }

    /// Points for a bill-based record. `None` means the record scores nothing
    /// and is not stored.
    pub fn bill_points(&self, passed: bool) -> Option<f64> {
        match self {
            ScoreCategory::ProposeBill => Some(if passed {
                PROPOSE_BILL_BASE_POINTS + PROPOSE_BILL_PASSED_BONUS
            } else {
                PROPOSE_BILL_BASE_POINTS
            }),
            ScoreCategory::CosignBill => passed.then_some(COSIGN_BILL_PASSED_POINTS),
            _ => None,
        }
    }
}

impl fmt::Display for ScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    #[serde(rename = "legislatorId")]
    pub legislator_id: ObjectId,

    /// Taipei midnight of the activity day, or of the week's Monday for
    /// week-based categories.
    pub date: BsonDateTime,

    pub category: ScoreCategory,

    pub points: f64,

    pub description: String,

    #[serde(rename = "billNumber", skip_serializing_if = "Option::is_none")]
    pub bill_number: Option<String>,

    #[serde(rename = "billTitle", skip_serializing_if = "Option::is_none")]
    pub bill_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,

    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
}

impl Score {
    pub fn dedupe_key(&self) -> ScoreKey {
        ScoreKey::for_score(
            self.legislator_id,
            self.category,
            self.date,
            &self.description,
            self.bill_number.as_deref(),
        )
    }
}

/// The natural key that must be unique among stored scores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScoreKey {
    Bill {
        legislator_id: ObjectId,
        category: ScoreCategory,
        bill_number: String,
    },
    ExactEvent {
        legislator_id: ObjectId,
        category: ScoreCategory,
        date: BsonDateTime,
        description: String,
    },
    WeekFingerprint {
        legislator_id: ObjectId,
        category: ScoreCategory,
        week_start: BsonDateTime,
        prefix: String,
    },
}

impl ScoreKey {
    pub fn for_score(
        legislator_id: ObjectId,
        category: ScoreCategory,
        date: BsonDateTime,
        description: &str,
        bill_number: Option<&str>,
    ) -> ScoreKey {
        match (category.dedupe_strategy(), bill_number) {
            (DedupeStrategy::Bill, Some(bill_number)) => ScoreKey::Bill {
                legislator_id,
                category,
                bill_number: bill_number.to_string(),
            },
            (DedupeStrategy::WeekFingerprint, _) => ScoreKey::WeekFingerprint {
                legislator_id,
                category,
                week_start: date,
                prefix: fingerprint(description),
            },
            _ => ScoreKey::ExactEvent {
                legislator_id,
                category,
                date,
                description: description.to_string(),
            },
        }
    }

    /// Does `score` collide with this key?
    pub fn matches(&self, score: &Score) -> bool {
        match self {
            ScoreKey::Bill {
                legislator_id,
                category,
                bill_number,
            } => {
                score.legislator_id == *legislator_id
                    && score.category == *category
                    && score.bill_number.as_deref() == Some(bill_number.as_str())
            }
            ScoreKey::ExactEvent {
                legislator_id,
                category,
                date,
                description,
            } => {
                score.legislator_id == *legislator_id
                    && score.category == *category
                    && score.date == *date
                    && score.description == *description
            }
            ScoreKey::WeekFingerprint {
                legislator_id,
                category,
                week_start,
                prefix,
            } => {
                score.legislator_id == *legislator_id
                    && score.category == *category
                    && score.date == *week_start
                    && score.description.starts_with(prefix.as_str())
            }
        }
    }
}

/// First `FINGERPRINT_CHARS` characters (not bytes) of a description.
pub fn fingerprint(description: &str) -> String {
    description.chars().take(FINGERPRINT_CHARS).collect()
}

/// A bill is passed when its free-text status mentions a third reading
/// (三讀) or passage (通過).
pub fn is_passed(status: Option<&str>) -> bool {
    match status {
        Some(status) => status.contains("三讀") || status.contains("通過"),
        None => false,
    }
}

/// Per-category totals for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryTotal {
    pub category: ScoreCategory,
    pub count: u64,
    pub points: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passed_detection_is_substring_based() {
        assert!(is_passed(Some("三讀通過")));
        assert!(!is_passed(Some("審查中")));
        assert!(is_passed(Some("已通過")));
        assert!(is_passed(Some("三讀")));
        assert!(!is_passed(None));
    }

    #[test]
    fn bill_points_follow_canonical_table() {
        assert_eq!(ScoreCategory::ProposeBill.bill_points(false), Some(3.0));
        assert_eq!(ScoreCategory::ProposeBill.bill_points(true), Some(9.0));
        assert_eq!(ScoreCategory::CosignBill.bill_points(true), Some(3.0));
        assert_eq!(ScoreCategory::CosignBill.bill_points(false), None);
        assert_eq!(ScoreCategory::FloorSpeech.bill_points(true), None);
    }

    #[test]
    fn categories_serialize_as_screaming_snake_case() {
        let json = serde_json::to_string(&ScoreCategory::WrittenInterpellation).unwrap();
        assert_eq!(json, "\"WRITTEN_INTERPELLATION\"");
        let legacy: ScoreCategory = serde_json::from_str("\"SIMULATED_ATTENDANCE\"").unwrap();
        assert_eq!(legacy, ScoreCategory::Legacy);
    }

    #[test]
    fn fingerprint_counts_characters_not_bytes() {
        let long = "記".repeat(80);
        assert_eq!(fingerprint(&long).chars().count(), FINGERPRINT_CHARS);
        assert_eq!(fingerprint("short"), "short");
    }

    #[test]
    fn week_key_matches_on_prefix() {
        let legislator_id = ObjectId::new();
        let monday = BsonDateTime::from_millis(1_710_086_400_000);
        let description = format!("記名表決 {} (贊成)", "x".repeat(60));
        let key = ScoreKey::for_score(
            legislator_id,
            ScoreCategory::RollcallVote,
            monday,
            &description,
            None,
        );
        let stored = Score {
            id: None,
            legislator_id,
            date: monday,
            category: ScoreCategory::RollcallVote,
            points: 1.0,
            description: format!("{} trailing", description),
            bill_number: None,
            bill_title: None,
            metadata: None,
            created_at: None,
        };
        assert!(key.matches(&stored));
        assert!(matches!(key, ScoreKey::WeekFingerprint { .. }));
    }
}
