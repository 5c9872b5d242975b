use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Ongoing,
    Ended,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Ongoing => "ongoing",
            SessionStatus::Ended => "ended",
        }
    }
}

/// Status of a schedule at `now`. The end instant itself already counts as ended.
pub fn compute_status(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SessionStatus {
    if now < start {
        SessionStatus::Pending
    } else if now >= end {
        SessionStatus::Ended
    } else {
        SessionStatus::Ongoing
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub id: u64,
    pub name: String,
    pub party: String,
    #[serde(rename = "imageUrl", default)]
    pub image_url: String,
    #[serde(rename = "voteCount")]
    pub vote_count: u64,
}

/// The current voting session. `VotingSession::default()` is the empty sentinel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct VotingSession {
    pub id: u64,
    pub title: String,
    #[serde(rename = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<SessionStatus>,
    #[serde(rename = "voteCount")]
    pub vote_count: u64,
    pub candidates: Vec<Candidate>,
}

impl VotingSession {
    pub fn is_empty(&self) -> bool {
        self.id == 0
    }

    pub fn candidate(&self, id: u64) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// Status recomputed against `now`; `None` while no schedule is set.
    pub fn status_at(&self, now: DateTime<Utc>) -> Option<SessionStatus> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(compute_status(start, end, now)),
            _ => None,
        }
    }

    pub fn recompute_totals(&mut self) {
        self.vote_count = total_votes(&self.candidates);
    }

    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        self.status = self.status_at(now);
    }
}

pub fn total_votes(candidates: &[Candidate]) -> u64 {
    candidates.iter().map(|c| c.vote_count).sum()
}
