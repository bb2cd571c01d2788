pub mod api;
pub mod draft;
pub mod feeds;
pub mod league;
pub mod legislator;
pub mod matchup;
pub mod rollcall;
pub mod score;
pub mod sync;
pub mod team;
