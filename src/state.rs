use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::services::http_fetch::HttpFetcher;
use crate::services::sync_runner::SyncService;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub fetcher: HttpFetcher,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig, fetcher: HttpFetcher) -> Self {
        AppState {
            store,
            config: Arc::new(config),
            fetcher,
        }
    }

    pub fn sync_service(&self) -> SyncService {
        SyncService::new(self.store.clone(), self.fetcher.clone(), self.config.clone())
    }
}
