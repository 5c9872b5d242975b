use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::{total_votes, Candidate, VotingSession};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LedgerCandidate {
    pub id: u64,
    pub name: String,
    pub party: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "voteCount", default)]
    pub vote_count: u64,
}

impl From<LedgerCandidate> for Candidate {
    fn from(c: LedgerCandidate) -> Self {
        Candidate {
            id: c.id,
            name: c.name,
            party: c.party,
            image_url: c.image_url,
            vote_count: c.vote_count,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VotingCreated {
    #[serde(rename = "votingId")]
    pub voting_id: u64,
    /// Unix seconds.
    pub start: i64,
    /// Unix seconds.
    pub end: i64,
    pub title: String,
    pub candidates: Vec<LedgerCandidate>,
}

impl VotingCreated {
    /// Session as recorded at creation time. Status is left for the caller to derive.
    pub fn to_session(&self) -> VotingSession {
        let candidates: Vec<Candidate> =
            self.candidates.iter().cloned().map(Candidate::from).collect();
        VotingSession {
            id: self.voting_id,
            title: self.title.clone(),
            start_time: from_unix(self.start),
            end_time: from_unix(self.end),
            status: None,
            vote_count: total_votes(&candidates),
            candidates,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "name", content = "args")]
pub enum LedgerEvent {
    VotingCreated(VotingCreated),
    Voted {
        #[serde(rename = "candidateId")]
        candidate_id: u64,
        /// Tally after this vote, not a delta.
        #[serde(rename = "voteCount")]
        vote_count: u64,
    },
    VotingDeleted,
}

impl LedgerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LedgerEvent::VotingCreated(_) => EventKind::VotingCreated,
            LedgerEvent::Voted { .. } => EventKind::Voted,
            LedgerEvent::VotingDeleted => EventKind::VotingDeleted,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    VotingCreated,
    Voted,
    VotingDeleted,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::VotingCreated,
        EventKind::Voted,
        EventKind::VotingDeleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::VotingCreated => "VotingCreated",
            EventKind::Voted => "Voted",
            EventKind::VotingDeleted => "VotingDeleted",
        }
    }
}

/// A decoded contract log with its position in the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    #[serde(rename = "logIndex", default)]
    pub log_index: u64,
    pub event: LedgerEvent,
}

impl LoggedEvent {
    pub fn position(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }
}

pub fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
