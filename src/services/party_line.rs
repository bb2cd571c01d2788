// src/services/party_line.rs
//! Party majorities on a roll-call item and the maverick bonus for
//! legislators who broke with their party.

use bson::oid::ObjectId;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::rollcall::{ResolvedVote, VoteChoice};

/// Minimum share (percent) of the party voting the other way for each tier.
pub const MAVERICK_TOP_THRESHOLD: f64 = 90.0;
pub const MAVERICK_MID_THRESHOLD: f64 = 80.0;
pub const MAVERICK_LOW_THRESHOLD: f64 = 70.0;

pub const MAVERICK_TOP_POINTS: f64 = 9.0;
pub const MAVERICK_MID_POINTS: f64 = 6.0;
pub const MAVERICK_LOW_POINTS: f64 = 3.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartyTally {
    pub for_count: u32,
    pub against_count: u32,
    pub abstain_count: u32,
}

impl PartyTally {
    pub fn total(&self) -> u32 {
        self.for_count + self.against_count + self.abstain_count
    }

    pub fn for_percentage(&self) -> f64 {
        percentage(self.for_count, self.total())
    }

    pub fn against_percentage(&self) -> f64 {
        percentage(self.against_count, self.total())
    }

    /// "for" only on a strict majority; an exact split counts as "against".
    pub fn majority(&self) -> VoteChoice {
        if self.for_percentage() > 50.0 {
            VoteChoice::For
        } else {
            VoteChoice::Against
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaverickAward {
    pub legislator_id: ObjectId,
    pub party: String,
    pub choice: VoteChoice,
    /// Share of the party that voted the other way.
    pub opposition_percentage: f64,
    pub points: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartyLineAnalysis {
    pub parties: BTreeMap<String, PartyTally>,
    pub mavericks: Vec<MaverickAward>,
}

pub fn analyze(votes: &[ResolvedVote]) -> PartyLineAnalysis {
    let mut parties: BTreeMap<String, PartyTally> = BTreeMap::new();
    for vote in votes {
        let tally = parties.entry(vote.party.clone()).or_default();
        match vote.choice {
            VoteChoice::For => tally.for_count += 1,
            VoteChoice::Against => tally.against_count += 1,
            VoteChoice::Abstain => tally.abstain_count += 1,
        }
    }

    let mavericks = votes
        .iter()
        .filter(|v| v.choice != VoteChoice::Abstain)
        .filter_map(|vote| {
            let tally = parties.get(&vote.party)?;
            if vote.choice == tally.majority() {
                return None;
            }
            let opposition = match vote.choice {
                VoteChoice::For => tally.against_percentage(),
                _ => tally.for_percentage(),
            };
            Some(MaverickAward {
                legislator_id: vote.legislator_id,
                party: vote.party.clone(),
                choice: vote.choice,
                opposition_percentage: opposition,
                points: maverick_points(opposition),
            })
        })
        .collect();

    PartyLineAnalysis { parties, mavericks }
}

pub fn maverick_points(opposition_percentage: f64) -> f64 {
    if opposition_percentage >= MAVERICK_TOP_THRESHOLD {
        MAVERICK_TOP_POINTS
    } else if opposition_percentage >= MAVERICK_MID_THRESHOLD {
        MAVERICK_MID_POINTS
    } else if opposition_percentage >= MAVERICK_LOW_THRESHOLD {
        MAVERICK_LOW_POINTS
    } else {
        0.0
    }
}

fn percentage(count: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}
