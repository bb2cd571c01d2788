// src/services/sync_runner.rs
//! Wires the adapters to the engine for the HTTP triggers and the CLI.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::config::AppConfig;
use crate::database::Store;
use crate::errors::Result;
use crate::models::{
    legislator::LegislatorFilter,
    sync::{SyncQuery, SyncSummary, SyncTarget},
};
use crate::services::legislator_directory;
use crate::services::legislator_matcher::LegislatorMatcher;
use crate::services::rollcall_sync::{DateWindow, RollcallSync};
use crate::services::score_sync::ScoreSyncEngine;
use crate::services::sources::{
    BillSource, InterpellationSource, LyApi, LyRollcallFeed, SpeechSource,
};
use crate::services::http_fetch::HttpFetcher;
use crate::services::week_calendar::today_local;

/// Result of one category inside an all-categories run.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CategoryOutcome {
    Completed(SyncSummary),
    Failed { error: String },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub results: BTreeMap<String, CategoryOutcome>,
}

impl SyncReport {
    pub fn all_succeeded(&self) -> bool {
        self.results
            .values()
            .all(|o| matches!(o, CategoryOutcome::Completed(_)))
    }

    pub fn failures(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|(category, outcome)| match outcome {
                CategoryOutcome::Failed { error } => Some(format!("{}: {}", category, error)),
                CategoryOutcome::Completed(_) => None,
            })
            .collect()
    }
}

pub struct SyncService {
    engine: ScoreSyncEngine,
    fetcher: HttpFetcher,
    config: Arc<AppConfig>,
}

impl SyncService {
    pub fn new(store: Arc<dyn Store>, fetcher: HttpFetcher, config: Arc<AppConfig>) -> Self {
        SyncService {
            engine: ScoreSyncEngine::new(store, config.sync),
            fetcher,
            config,
        }
    }

    fn api(&self) -> LyApi {
        LyApi::new(self.fetcher.clone(), &self.config.feeds)
    }

    /// Speech and roll-call window; defaults to season start through today.
    pub fn window(&self, query: &SyncQuery) -> Result<DateWindow> {
        DateWindow::new(
            query.from.unwrap_or(self.config.season_start),
            query.to.unwrap_or_else(today_local),
        )
    }

    pub async fn run(&self, target: SyncTarget, query: &SyncQuery) -> Result<SyncSummary> {
        query.validate()?;
        let filter = LegislatorFilter {
            name_contains: query.legislator.clone(),
            limit: query.limit,
            offset: query.offset,
        };

        info!(category = %target, legislator = ?query.legislator, "Sync requested");

        match target {
            SyncTarget::Proposals => {
                self.engine
                    .sync_source(&BillSource::proposals(self.api()), &filter)
                    .await
            }
            SyncTarget::Cosigns => {
                self.engine
                    .sync_source(&BillSource::cosigns(self.api()), &filter)
                    .await
            }
            SyncTarget::Interpellations => {
                self.engine
                    .sync_source(&InterpellationSource::new(self.api()), &filter)
                    .await
            }
            SyncTarget::Speeches => {
                let window = self.window(query)?;
                let everyone = self
                    .engine
                    .store()
                    .list_legislators(&LegislatorFilter::all())
                    .await?;
                let matcher = LegislatorMatcher::new(everyone);
                let source = SpeechSource::prepare(
                    &self.fetcher,
                    &self.config.feeds,
                    &matcher,
                    window.from,
                    window.to,
                )
                .await?;
                let mut summary = self.engine.sync_source(&source, &filter).await?;
                summary.warnings.extend(source.warnings().iter().cloned());
                Ok(summary)
            }
            SyncTarget::Rollcalls => {
                let window = self.window(query)?;
                let feed = LyRollcallFeed::new(
                    self.fetcher.clone(),
                    self.config.feeds.rollcall_index_url.clone(),
                );
                RollcallSync::new(&self.engine, &feed).run(window, &filter).await
            }
        }
    }

    /// Every category in turn. A fatal failure in one category is recorded
    /// and the next category still runs.
    pub async fn run_all(&self, query: &SyncQuery) -> Result<SyncReport> {
        query.validate()?;
        let mut report = SyncReport::default();
        for target in SyncTarget::ALL {
            let outcome = match self.run(target, query).await {
                Ok(summary) => CategoryOutcome::Completed(summary),
                Err(e) => {
                    error!(category = %target, error = %e, "❌ Category sync failed");
                    CategoryOutcome::Failed {
                        error: e.to_string(),
                    }
                }
            };
            report.results.insert(target.as_str().to_string(), outcome);
        }
        Ok(report)
    }

    pub async fn sync_legislators(&self) -> Result<SyncSummary> {
        legislator_directory::sync_legislators(self.engine.store().as_ref(), &self.api()).await
    }
}
