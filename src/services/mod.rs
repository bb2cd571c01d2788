pub mod draft;
pub mod http_fetch;
pub mod legislator_directory;
pub mod legislator_matcher;
pub mod party_line;
pub mod roster;
pub mod rollcall_sync;
pub mod scheduler;
pub mod score_report;
pub mod score_sync;
pub mod sources;
pub mod sync_runner;
pub mod week_calendar;
