// src/services/sources/rollcall.rs
//! Roll-call votes: an index of vote events, each pointing at a spreadsheet
//! that lists voters under 贊成 / 反對 / 棄權 section headers.

use async_trait::async_trait;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;
use tracing::debug;

use super::numbered_names;
use crate::errors::{AppError, Result};
use crate::models::{
    feeds::{RollcallEvent, RollcallIndex},
    rollcall::{VoteChoice, VotingData},
};
use crate::services::http_fetch::HttpFetcher;

#[async_trait]
pub trait RollcallFeed: Send + Sync {
    /// The list every roll-call run depends on. Failure is fatal.
    async fn fetch_index(&self) -> Result<Vec<RollcallEvent>>;

    async fn fetch_votes(&self, event: &RollcallEvent) -> Result<Vec<VotingData>>;
}

pub struct LyRollcallFeed {
    fetcher: HttpFetcher,
    index_url: String,
}

impl LyRollcallFeed {
    pub fn new(fetcher: HttpFetcher, index_url: impl Into<String>) -> Self {
        LyRollcallFeed {
            fetcher,
            index_url: index_url.into(),
        }
    }
}

#[async_trait]
impl RollcallFeed for LyRollcallFeed {
    async fn fetch_index(&self) -> Result<Vec<RollcallEvent>> {
        let index: Option<RollcallIndex> = self.fetcher.get_json(&self.index_url, &[]).await?;
        match index {
            Some(index) => Ok(index.into_events()),
            None => Err(AppError::external_api(format!(
                "roll-call index at {} was rejected by the server",
                self.index_url
            ))),
        }
    }

    async fn fetch_votes(&self, event: &RollcallEvent) -> Result<Vec<VotingData>> {
        let url = event.file_url.as_deref().ok_or_else(|| {
            AppError::invalid_data(format!("roll-call '{}' has no spreadsheet link", event.title))
        })?;
        let bytes = self.fetcher.get_bytes(url).await?;
        let votes = parse_vote_sheet(bytes)?;
        debug!(title = %event.title, votes = votes.len(), "Parsed roll-call sheet");
        Ok(votes)
    }
}

/// Reads the first worksheet of an xls/xlsx/ods payload.
pub fn parse_vote_sheet(bytes: Vec<u8>) -> Result<Vec<VotingData>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Spreadsheet("workbook has no sheets".to_string()))??;
    Ok(parse_vote_lines(&sheet_lines(&range)))
}

/// Flattens a sheet into text lines, one per non-empty cell. A cell holding
/// only a seat number is joined with the cell after it.
pub fn sheet_lines(range: &Range<Data>) -> Vec<String> {
    let mut lines = Vec::new();
    for row in range.rows() {
        let cells: Vec<String> = row.iter().filter_map(cell_text).collect();
        let mut i = 0;
        while i < cells.len() {
            let cell = &cells[i];
            let is_seat = cell.chars().all(|c| c.is_ascii_digit());
            match cells.get(i + 1) {
                Some(next) if is_seat && !next.chars().all(|c| c.is_ascii_digit()) => {
                    lines.push(format!("{} {}", cell, next));
                    i += 2;
                }
                _ => {
                    lines.push(cell.clone());
                    i += 1;
                }
            }
        }
    }
    lines
}

fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.trim().to_string(),
        // Seat numbers typed as numbers lose their zero padding; the parser
        // only needs the digits.
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Int(i) => i.to_string(),
        other => other.to_string().trim().to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Walks the lines keeping track of the current section header. Names seen
/// before the first header (titles, notes) are ignored.
pub fn parse_vote_lines(lines: &[String]) -> Vec<VotingData> {
    let mut current: Option<VoteChoice> = None;
    let mut votes = Vec::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(choice) = VoteChoice::from_header(line) {
            current = Some(choice);
            // "贊成：0001 王小明" keeps names on the header line.
            if let Some((_, rest)) = line.split_once([':', '：']) {
                push_names(&mut votes, rest, choice);
            }
            continue;
        }
        if let Some(choice) = current {
            push_names(&mut votes, line, choice);
        }
    }
    votes
}

fn push_names(votes: &mut Vec<VotingData>, line: &str, choice: VoteChoice) {
    votes.extend(numbered_names(line).into_iter().map(|name| VotingData {
        legislator_name: name,
        vote: choice,
    }));
}
