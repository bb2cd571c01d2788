// src/services/legislator_directory.rs
//! Refreshes the legislator table from the LY member list.

use tracing::{error, info};

use crate::database::Store;
use crate::errors::Result;
use crate::models::{
    feeds::LegislatorRecord,
    legislator::{external_id_from_pic_url, Legislator},
    sync::SyncSummary,
};
use crate::services::sources::LyApi;
use crate::services::week_calendar::parse_feed_date;

/// Upserts every current-term member by Chinese name. A failure to fetch
/// the list is fatal; a failure to store one member is counted.
pub async fn sync_legislators(store: &dyn Store, api: &LyApi) -> Result<SyncSummary> {
    let query = [("屆", api.term().to_string())];
    let records: Vec<LegislatorRecord> = api.fetch_all_pages("legislators", &query).await?;
    info!(count = records.len(), term = api.term(), "📂 Legislator directory fetched");

    let mut summary = SyncSummary::default();
    for record in &records {
        let legislator = legislator_from_record(record);
        match store.upsert_legislator(&legislator).await {
            Ok(_) => summary.processed_count += 1,
            Err(e) => {
                error!(legislator = %legislator.name_ch, error = %e, "❌ Failed to upsert legislator");
                summary.error_count += 1;
                summary.errors.push(format!("{}: {}", legislator.name_ch, e));
            }
        }
    }

    info!(
        processed = summary.processed_count,
        errors = summary.error_count,
        "✅ Legislator directory synced"
    );
    Ok(summary)
}

pub fn legislator_from_record(record: &LegislatorRecord) -> Legislator {
    let mut legislator = Legislator::new(
        record.name.trim(),
        record.party.clone().unwrap_or_default(),
    );
    legislator.name_en = record.name_en.clone().filter(|s| !s.is_empty());
    legislator.region = record.region.clone().unwrap_or_default();
    legislator.pic_url = record.pic_url.clone();
    legislator.external_id = record.pic_url.as_deref().and_then(external_id_from_pic_url);
    legislator.leave_date = record.leave_date.as_deref().and_then(parse_feed_date);
    legislator.leave_reason = record.leave_reason.clone().filter(|s| !s.trim().is_empty());
    legislator.is_leave = legislator.leave_date.is_some();
    legislator
}
