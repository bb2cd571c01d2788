// src/services/sources/interpellation.rs

use async_trait::async_trait;
use serde_json::json;

use super::{LegislatorSource, LyApi};
use crate::errors::Result;
use crate::models::{
    feeds::InterpellationRecord,
    legislator::Legislator,
    score::{ScoreCategory, WRITTEN_INTERPELLATION_POINTS},
    sync::NormalizedRecord,
};
use crate::services::legislator_matcher::han_only;
use crate::services::week_calendar::parse_feed_date;

pub struct InterpellationSource {
    api: LyApi,
}

impl InterpellationSource {
    pub fn new(api: LyApi) -> Self {
        InterpellationSource { api }
    }
}

#[async_trait]
impl LegislatorSource for InterpellationSource {
    fn category(&self) -> ScoreCategory {
        ScoreCategory::WrittenInterpellation
    }

    fn source_tag(&self) -> &'static str {
        "interpellations"
    }

    async fn fetch(&self, legislator: &Legislator) -> Result<Vec<NormalizedRecord>> {
        // This endpoint mishandles Latin fragments in Indigenous names.
        let name = han_only(&legislator.name_ch);
        let query = [("質詢委員", name), ("屆", self.api.term().to_string())];
        let items: Vec<InterpellationRecord> =
            self.api.fetch_all_pages("interpellations", &query).await?;
        Ok(items.iter().map(normalize_interpellation).collect())
    }
}

pub fn normalize_interpellation(item: &InterpellationRecord) -> NormalizedRecord {
    let subject = item
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or(item.interpellation_no.as_deref())
        .unwrap_or("書面質詢");

    NormalizedRecord {
        category: ScoreCategory::WrittenInterpellation,
        date: item.published_date.as_deref().and_then(parse_feed_date),
        points: WRITTEN_INTERPELLATION_POINTS,
        description: format!("書面質詢：{}", subject),
        bill_number: None,
        bill_title: None,
        metadata: Some(json!({
            "interpellationNo": item.interpellation_no,
            "term": item.term,
            "session": item.session,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn interpellation_maps_reason_and_date() {
        let item = InterpellationRecord {
            interpellation_no: Some("11-1-3-01".to_string()),
            published_date: Some("2024-03-15".to_string()),
            reason: Some(" 針對國道交通安全提出質詢 ".to_string()),
            explanation: None,
            interpellators: vec!["王小明".to_string()],
            term: Some(11),
            session: Some(1),
        };
        let record = normalize_interpellation(&item);
        assert_eq!(record.points, WRITTEN_INTERPELLATION_POINTS);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(record.description, "書面質詢：針對國道交通安全提出質詢");
        assert!(record.bill_number.is_none());
    }

    #[test]
    fn missing_reason_falls_back_to_number() {
        let item = InterpellationRecord {
            interpellation_no: Some("11-1-3-02".to_string()),
            published_date: None,
            reason: None,
            explanation: None,
            interpellators: vec![],
            term: None,
            session: None,
        };
        let record = normalize_interpellation(&item);
        assert_eq!(record.description, "書面質詢：11-1-3-02");
        assert_eq!(record.date, None);
    }
}
