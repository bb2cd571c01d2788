// src/services/sources/mod.rs
//! Adapters over the Legislative Yuan feeds. Each one turns source records
//! into `NormalizedRecord`s; storing them is the sync engine's job.

pub mod bills;
pub mod interpellation;
pub mod rollcall;
pub mod speech;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::errors::Result;
use crate::models::{feeds::LyPage, legislator::Legislator, score::ScoreCategory, sync::NormalizedRecord};
use crate::services::http_fetch::HttpFetcher;

pub use bills::BillSource;
pub use interpellation::InterpellationSource;
pub use rollcall::{LyRollcallFeed, RollcallFeed};
pub use speech::SpeechSource;

/// A feed that is queried one legislator at a time.
#[async_trait]
pub trait LegislatorSource: Send + Sync {
    fn category(&self) -> ScoreCategory;

    /// Short tag used in logs and in the legislator's error reason.
    fn source_tag(&self) -> &'static str;

    async fn fetch(&self, legislator: &Legislator) -> Result<Vec<NormalizedRecord>>;
}

/// Client for the paginated `ly.govapi.tw` resources.
#[derive(Debug, Clone)]
pub struct LyApi {
    fetcher: HttpFetcher,
    base: String,
    term: u32,
}

impl LyApi {
    pub fn new(fetcher: HttpFetcher, feeds: &FeedConfig) -> Self {
        LyApi {
            fetcher,
            base: feeds.ly_api_base.trim_end_matches('/').to_string(),
            term: feeds.term,
        }
    }

    pub fn term(&self) -> u32 {
        self.term
    }

    /// Reads page 1, then pages 2..=total_page in order. Only the first page
    /// can fail the call; a later page that fails is logged and skipped.
    /// A client error or an error-shaped body means "no records".
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base, resource);

        let first = match self
            .fetcher
            .get_json::<LyPage<T>>(&url, &with_page(query, 1))
            .await?
        {
            Some(page) => page,
            None => return Ok(Vec::new()),
        };
        if first.is_error() {
            warn!(
                url = %url,
                error = first.error_message().unwrap_or_default(),
                "Feed answered with an error body, treating as empty"
            );
            return Ok(Vec::new());
        }

        let total_pages = first.total_page;
        let mut items = first.items;

        for page in 2..=total_pages {
            match self
                .fetcher
                .get_json::<LyPage<T>>(&url, &with_page(query, page))
                .await
            {
                Ok(Some(next)) if !next.is_error() => items.extend(next.items),
                Ok(_) => warn!(url = %url, page, "Page came back empty or error-shaped, skipping"),
                Err(e) => warn!(url = %url, page, error = %e, "Page fetch failed, skipping"),
            }
        }

        debug!(url = %url, pages = total_pages, items = items.len(), "Fetched feed");
        Ok(items)
    }
}

fn with_page<'a>(query: &[(&'a str, String)], page: u32) -> Vec<(&'a str, String)> {
    let mut out = query.to_vec();
    out.push(("page", page.to_string()));
    out
}

/// Reads a `"0001 王小明"` entry (seat number, whitespace, name). Entries
/// without a seat number are taken as a bare name.
pub fn strip_seat_number(entry: &str) -> Option<String> {
    let name = entry
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit())
        .trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Every "number + whitespace + name" occurrence in a line. Tokens that are
/// not preceded by a seat number are ignored.
pub fn numbered_names(line: &str) -> Vec<String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut names = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        let digits = token.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            i += 1;
            continue;
        }
        if digits < token.len() {
            // "0001王小明"
            names.push(token[digits..].to_string());
            i += 1;
        } else if let Some(next) = tokens.get(i + 1) {
            if next.chars().all(|c| c.is_ascii_digit()) {
                i += 1;
            } else {
                names.push(next.to_string());
                i += 2;
            }
        } else {
            i += 1;
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_numbers_are_stripped() {
        assert_eq!(strip_seat_number("0001 王小明").as_deref(), Some("王小明"));
        assert_eq!(strip_seat_number(" 李大華 ").as_deref(), Some("李大華"));
        assert_eq!(strip_seat_number("0002").as_deref(), None);
    }

    #[test]
    fn numbered_names_reads_several_per_line() {
        assert_eq!(numbered_names("0001  王小明"), vec!["王小明"]);
        assert_eq!(
            numbered_names("0001 王小明 0002 李大華"),
            vec!["王小明", "李大華"]
        );
        assert_eq!(numbered_names("0003陳美玲"), vec!["陳美玲"]);
        assert!(numbered_names("第11屆第1會期第3次會議").is_empty());
        assert!(numbered_names("65").is_empty());
    }

    #[test]
    fn page_param_is_appended() {
        let query = vec![("屆", "11".to_string())];
        let paged = with_page(&query, 3);
        assert_eq!(paged.last(), Some(&("page", "3".to_string())));
        assert_eq!(paged.len(), 2);
    }
}
