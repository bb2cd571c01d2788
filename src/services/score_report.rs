// src/services/score_report.rs
//! A legislator's points for one week, grouped by category.

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::database::Store;
use crate::errors::{AppError, Result};
use crate::models::score::{CategoryTotal, Score, ScoreCategory};
use crate::services::week_calendar::week_date_range;

#[derive(Debug, Clone, Serialize)]
pub struct WeeklyBreakdown {
    #[serde(rename = "legislatorId")]
    pub legislator_id: ObjectId,
    #[serde(rename = "legislatorName")]
    pub legislator_name: String,
    pub week: u32,
    #[serde(rename = "weekStart")]
    pub week_start: NaiveDate,
    #[serde(rename = "weekEnd")]
    pub week_end: NaiveDate,
    pub total: f64,
    pub categories: Vec<CategoryTotal>,
    pub scores: Vec<Score>,
}

pub async fn weekly_breakdown(
    store: &dyn Store,
    legislator_id: &ObjectId,
    season_start: NaiveDate,
    week: u32,
) -> Result<WeeklyBreakdown> {
    if week == 0 {
        return Err(AppError::ValidationError("week numbers start at 1".to_string()));
    }
    let legislator = store
        .get_legislator(legislator_id)
        .await?
        .ok_or_else(|| AppError::not_found("Legislator"))?;

    let range = week_date_range(season_start, week);
    let (from, to) = range.to_utc();
    let mut scores = store
        .scores_for_legislators(
            std::slice::from_ref(legislator_id),
            BsonDateTime::from_chrono(from),
            BsonDateTime::from_chrono(to),
        )
        .await?;
    scores.sort_by_key(|s| s.date);

    Ok(WeeklyBreakdown {
        legislator_id: *legislator_id,
        legislator_name: legislator.name_ch,
        week,
        week_start: range.start_date(),
        week_end: range.end_date(),
        total: scores.iter().map(|s| s.points).sum(),
        categories: category_totals(&scores),
        scores,
    })
}

pub fn category_totals(scores: &[Score]) -> Vec<CategoryTotal> {
    let mut totals: BTreeMap<ScoreCategory, (u64, f64)> = BTreeMap::new();
    for score in scores {
        let entry = totals.entry(score.category).or_default();
        entry.0 += 1;
        entry.1 += score.points;
    }
    totals
        .into_iter()
        .map(|(category, (count, points))| CategoryTotal {
            category,
            count,
            points,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(category: ScoreCategory, points: f64) -> Score {
        Score {
            id: None,
            legislator_id: ObjectId::new(),
            date: BsonDateTime::from_millis(0),
            category,
            points,
            description: String::new(),
            bill_number: None,
            bill_title: None,
            metadata: None,
            created_at: None,
        }
    }

    #[test]
    fn totals_group_by_category() {
        let totals = category_totals(&[
            score(ScoreCategory::FloorSpeech, 1.0),
            score(ScoreCategory::ProposeBill, 9.0),
            score(ScoreCategory::FloorSpeech, 1.0),
        ]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].category, ScoreCategory::ProposeBill);
        assert_eq!(totals[0].points, 9.0);
        assert_eq!(totals[1].count, 2);
        assert_eq!(totals[1].points, 2.0);
    }
}
