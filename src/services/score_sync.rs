// src/services/score_sync.rs
//! Batch loop shared by every per-legislator source.

use bson::{oid::ObjectId, DateTime as BsonDateTime};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::SyncSettings;
use crate::database::Store;
use crate::errors::{AppError, Result};
use crate::models::{
    legislator::{Legislator, LegislatorFilter},
    score::Score,
    sync::{NormalizedRecord, SyncSummary},
};
use crate::services::sources::LegislatorSource;
use crate::services::week_calendar::{local_midnight_utc, week_monday};

pub struct ScoreSyncEngine {
    store: Arc<dyn Store>,
    settings: SyncSettings,
}

impl ScoreSyncEngine {
    pub fn new(store: Arc<dyn Store>, settings: SyncSettings) -> Self {
        ScoreSyncEngine { store, settings }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Runs `source` for every legislator selected by `filter`. Only a
    /// failure to list the legislators is returned as `Err`; per-legislator
    /// failures are counted in the summary.
    pub async fn sync_source(
        &self,
        source: &dyn LegislatorSource,
        filter: &LegislatorFilter,
    ) -> Result<SyncSummary> {
        let legislators = self.store.list_legislators(filter).await?;
        let batch_size = self.settings.batch_size.max(1);
        let batch_count = legislators.len().div_ceil(batch_size);

        info!(
            source = source.source_tag(),
            legislators = legislators.len(),
            batches = batch_count,
            "🔄 Starting score sync"
        );

        let mut summary = SyncSummary::default();

        for (index, batch) in legislators.chunks(batch_size).enumerate() {
            debug!(
                source = source.source_tag(),
                batch = index + 1,
                of = batch_count,
                "Processing batch"
            );

            let outcomes = join_all(batch.iter().map(|l| self.sync_legislator(source, l))).await;

            for (legislator, outcome) in batch.iter().zip(outcomes) {
                match outcome {
                    Ok(created) => {
                        summary.processed_count += 1;
                        summary.total_scores_created += created;
                    }
                    Err(e) => {
                        summary.error_count += 1;
                        summary.errors.push(format!("{}: {}", legislator.name_ch, e));
                    }
                }
            }

            if index + 1 < batch_count && !self.settings.batch_delay.is_zero() {
                tokio::time::sleep(self.settings.batch_delay).await;
            }
        }

        info!(
            source = source.source_tag(),
            processed = summary.processed_count,
            errors = summary.error_count,
            created = summary.total_scores_created,
            "✅ Score sync finished"
        );
        Ok(summary)
    }

    /// Fetch and store one legislator, then raise or clear their error flag.
    async fn sync_legislator(
        &self,
        source: &dyn LegislatorSource,
        legislator: &Legislator,
    ) -> Result<u32> {
        let id = legislator
            .id
            .ok_or_else(|| AppError::invalid_data(format!("legislator {} has no id", legislator.name_ch)))?;

        let outcome = match source.fetch(legislator).await {
            Ok(records) => self.process_records(&id, &records).await,
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(created) => {
                debug!(legislator = %legislator.name_ch, created, "Legislator synced");
                if legislator.error_flag {
                    if let Err(e) = self.store.set_legislator_error(&id, None).await {
                        warn!(legislator = %legislator.name_ch, error = %e, "Could not clear error flag");
                    }
                }
            }
            Err(e) => {
                error!(
                    legislator = %legislator.name_ch,
                    source = source.source_tag(),
                    error = %e,
                    "❌ Legislator sync failed"
                );
                let reason = format!("[{}] {}", source.source_tag(), e);
                if let Err(flag_err) = self.store.set_legislator_error(&id, Some(reason)).await {
                    warn!(legislator = %legislator.name_ch, error = %flag_err, "Could not set error flag");
                }
            }
        }

        outcome
    }

    /// Stores the records that are not already present. Returns how many
    /// scores were created.
    pub async fn process_records(
        &self,
        legislator_id: &ObjectId,
        records: &[NormalizedRecord],
    ) -> Result<u32> {
        let mut created = 0;
        for record in records {
            let Some(score) = score_from_record(*legislator_id, record) else {
                warn!(
                    legislator_id = %legislator_id,
                    category = %record.category,
                    description = %record.description,
                    "Record has no usable date, skipping"
                );
                continue;
            };

            if self.store.find_score(&score.dedupe_key()).await?.is_some() {
                continue;
            }

            match self.store.create_score(score).await {
                Ok(_) => created += 1,
                // A concurrent run got there first.
                Err(AppError::DuplicateKey) => debug!(
                    legislator_id = %legislator_id,
                    category = %record.category,
                    "Score already stored"
                ),
                Err(e) => return Err(e),
            }
        }
        Ok(created)
    }
}

/// The attribution date is the activity day, or the week's Monday for
/// week-based categories, at Taipei midnight.
pub fn score_from_record(legislator_id: ObjectId, record: &NormalizedRecord) -> Option<Score> {
    let day = record.date?;
    let day = if record.category.is_week_based() {
        week_monday(day)
    } else {
        day
    };

    Some(Score {
        id: None,
        legislator_id,
        date: BsonDateTime::from_chrono(local_midnight_utc(day)),
        category: record.category,
        points: record.points,
        description: record.description.clone(),
        bill_number: record.bill_number.clone(),
        bill_title: record.bill_title.clone(),
        metadata: record.metadata.clone(),
        created_at: None,
    })
}
