// src/services/sources/speech.rs
//! Floor speeches. The open-data feed is keyed by a date range rather than
//! by legislator, so the whole window is fetched once and split per
//! legislator before the engine walks the roster.

use async_trait::async_trait;
use bson::oid::ObjectId;
use chrono::NaiveDate;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use tracing::{info, warn};

use super::{strip_seat_number, LegislatorSource};
use crate::config::FeedConfig;
use crate::errors::Result;
use crate::models::{
    feeds::{SpeechFeed, SpeechMeeting},
    legislator::Legislator,
    score::{ScoreCategory, FLOOR_SPEECH_POINTS},
    sync::NormalizedRecord,
};
use crate::services::http_fetch::HttpFetcher;
use crate::services::legislator_matcher::LegislatorMatcher;
use crate::services::week_calendar::{parse_feed_date, to_roc_date, RocFormat};

const SPEECH_DATASET_PATH: &str = "ID148Action.action";

pub struct SpeechSource {
    by_legislator: HashMap<ObjectId, Vec<NormalizedRecord>>,
    warnings: Vec<String>,
    meeting_count: usize,
}

impl SpeechSource {
    /// Downloads the feed for `[from, to]`. A failed download is fatal for
    /// the run.
    pub async fn prepare(
        fetcher: &HttpFetcher,
        feeds: &FeedConfig,
        matcher: &LegislatorMatcher,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self> {
        let meetings = fetch_speech_feed(fetcher, feeds, from, to).await?;
        info!(
            meetings = meetings.len(),
            from = %from,
            to = %to,
            "📂 Speech feed loaded"
        );
        Ok(Self::from_meetings(&meetings, matcher))
    }

    pub fn from_meetings(meetings: &[SpeechMeeting], matcher: &LegislatorMatcher) -> Self {
        let mut by_legislator: HashMap<ObjectId, Vec<NormalizedRecord>> = HashMap::new();
        let mut unresolved = BTreeSet::new();

        for meeting in meetings {
            let date = meeting.meeting_date.as_deref().and_then(parse_feed_date);
            let title = meeting
                .meeting_name
                .as_deref()
                .or(meeting.meeting_room.as_deref())
                .unwrap_or("院會");

            for name in speecher_names(meeting.speechers.as_deref().unwrap_or_default()) {
                let Some(legislator) = matcher.match_name(&name) else {
                    unresolved.insert(name);
                    continue;
                };
                let Some(id) = legislator.id else {
                    continue;
                };
                by_legislator.entry(id).or_default().push(NormalizedRecord {
                    category: ScoreCategory::FloorSpeech,
                    date,
                    points: FLOOR_SPEECH_POINTS,
                    description: format!("院會發言：{}", title),
                    bill_number: None,
                    bill_title: None,
                    metadata: Some(json!({
                        "meetingName": meeting.meeting_name,
                        "meetingRoom": meeting.meeting_room,
                        "speecher": name,
                    })),
                });
            }
        }

        let warnings: Vec<String> = unresolved
            .into_iter()
            .map(|name| format!("[speeches] unresolved speaker name: {}", name))
            .collect();
        for warning in &warnings {
            warn!("{}", warning);
        }

        SpeechSource {
            by_legislator,
            warnings,
            meeting_count: meetings.len(),
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn meeting_count(&self) -> usize {
        self.meeting_count
    }
}

#[async_trait]
impl LegislatorSource for SpeechSource {
    fn category(&self) -> ScoreCategory {
        ScoreCategory::FloorSpeech
    }

    fn source_tag(&self) -> &'static str {
        "speeches"
    }

    async fn fetch(&self, legislator: &Legislator) -> Result<Vec<NormalizedRecord>> {
        Ok(legislator
            .id
            .and_then(|id| self.by_legislator.get(&id).cloned())
            .unwrap_or_default())
    }
}

async fn fetch_speech_feed(
    fetcher: &HttpFetcher,
    feeds: &FeedConfig,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SpeechMeeting>> {
    let url = format!(
        "{}/{}",
        feeds.open_data_base.trim_end_matches('/'),
        SPEECH_DATASET_PATH
    );
    let query = [
        ("term", feeds.term.to_string()),
        ("sMeetingDate", to_roc_date(from, RocFormat::Compact)),
        ("eMeetingDate", to_roc_date(to, RocFormat::Compact)),
        ("fileType", "json".to_string()),
    ];
    let feed: Option<SpeechFeed> = fetcher.get_json(&url, &query).await?;
    Ok(feed.map(|f| f.items).unwrap_or_default())
}

/// Splits a `"0001 王小明,0002 李大華"` list into bare names.
pub fn speecher_names(raw: &str) -> Vec<String> {
    raw.split([',', '，', '、', ';'])
        .filter_map(strip_seat_number)
        .collect()
}
