// config.rs
use chrono::NaiveDate;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{AppError, Result};

pub const DEFAULT_LY_API_BASE: &str = "https://ly.govapi.tw/v2";
pub const DEFAULT_LY_OPEN_DATA_BASE: &str = "https://data.ly.gov.tw/odw";
pub const DEFAULT_ROLLCALL_INDEX_URL: &str =
    "https://data.ly.gov.tw/odw/openDatasetJson.action?id=RollCallVote";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub cron_secret: Option<String>,
    pub host: String,
    pub port: u16,
    pub season_start: NaiveDate,
    pub feeds: FeedConfig,
    pub sync: SyncSettings,
    pub fetch: FetchSettings,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub ly_api_base: String,
    pub open_data_base: String,
    pub rollcall_index_url: String,
    pub term: u32,
}

/// Batching knobs for the score sync engine.
#[derive(Debug, Clone, Copy)]
pub struct SyncSettings {
    pub batch_size: usize,
    pub batch_delay: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            ly_api_base: DEFAULT_LY_API_BASE.to_string(),
            open_data_base: DEFAULT_LY_OPEN_DATA_BASE.to_string(),
            rollcall_index_url: DEFAULT_ROLLCALL_INDEX_URL.to_string(),
            term: 11,
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            batch_size: 5,
            batch_delay: Duration::from_millis(1000),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1000),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::configuration("DATABASE_URL must be set"))?;

        let season_start = match env::var("SEASON_START") {
            Ok(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                AppError::configuration(format!("SEASON_START must be YYYY-MM-DD: {}", e))
            })?,
            Err(_) => default_season_start(),
        };

        let defaults = SyncSettings::default();
        let fetch_defaults = FetchSettings::default();

        Ok(AppConfig {
            database_url,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "ly_fantasy".to_string()),
            cron_secret: env::var("CRON_SECRET").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 10000)?,
            season_start,
            feeds: FeedConfig {
                ly_api_base: env::var("LY_API_BASE")
                    .unwrap_or_else(|_| DEFAULT_LY_API_BASE.to_string()),
                open_data_base: env::var("LY_OPEN_DATA_BASE")
                    .unwrap_or_else(|_| DEFAULT_LY_OPEN_DATA_BASE.to_string()),
                rollcall_index_url: env::var("ROLLCALL_INDEX_URL")
                    .unwrap_or_else(|_| DEFAULT_ROLLCALL_INDEX_URL.to_string()),
                term: parse_var("LY_TERM", 11)?,
            },
            sync: SyncSettings {
                batch_size: parse_var("SYNC_BATCH_SIZE", defaults.batch_size)?.max(1),
                batch_delay: Duration::from_millis(parse_var(
                    "SYNC_BATCH_DELAY_MS",
                    defaults.batch_delay.as_millis() as u64,
                )?),
            },
            fetch: FetchSettings {
                max_retries: parse_var("FETCH_MAX_RETRIES", fetch_defaults.max_retries)?.max(1),
                initial_backoff: Duration::from_millis(parse_var(
                    "FETCH_INITIAL_BACKOFF_MS",
                    fetch_defaults.initial_backoff.as_millis() as u64,
                )?),
                timeout: Duration::from_secs(parse_var(
                    "HTTP_TIMEOUT_SECS",
                    fetch_defaults.timeout.as_secs(),
                )?),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "database_name": self.database_name,
            "cron_secret_set": self.cron_secret.is_some(),
            "season_start": self.season_start.to_string(),
            "ly_api_base": self.feeds.ly_api_base,
            "open_data_base": self.feeds.open_data_base,
            "term": self.feeds.term,
            "batch_size": self.sync.batch_size,
            "batch_delay_ms": self.sync.batch_delay.as_millis() as u64,
            "fetch_max_retries": self.fetch.max_retries,
            "port": self.port,
            "host": self.host,
        })
    }
}

fn default_season_start() -> NaiveDate {
    // 11th term, first session opened the week of 2024-02-19.
    NaiveDate::from_ymd_opt(2024, 2, 19).unwrap_or_default()
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::configuration(format!("{} is invalid: {}", key, e))),
        Err(_) => Ok(default),
    }
}
