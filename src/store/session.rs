use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use super::storage::Storage;
use crate::error::Result;
use crate::models::draft::MIN_CANDIDATES;
use crate::models::session::VotingSession;

pub const SESSION_KEY: &str = "voting-session";

pub type SharedSessionStore = Arc<Mutex<SessionStore>>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    #[serde(rename = "isVotingSessionCreated")]
    pub session_created: bool,
    #[serde(rename = "votingData")]
    pub session: VotingSession,
    /// Staging count that sizes the creation form.
    #[serde(rename = "candidatesCount")]
    pub candidates_count: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_created: false,
            session: VotingSession::default(),
            candidates_count: MIN_CANDIDATES,
        }
    }
}

/// The current session, written through to storage on every mutation.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: SessionState,
    max_candidates: usize,
}

impl SessionStore {
    pub fn load(storage: Arc<dyn Storage>, max_candidates: usize) -> Result<Self> {
        let state = match storage.read(SESSION_KEY)? {
            Some(blob) => match serde_json::from_str::<SessionState>(&blob) {
                Ok(state) => {
                    debug!("Restored voting session {}", state.session.id);
                    state
                }
                Err(e) => {
                    warn!("Discarding unreadable {SESSION_KEY} blob: {e}");
                    SessionState::default()
                }
            },
            None => SessionState::default(),
        };
        Ok(Self {
            storage,
            state,
            max_candidates: max_candidates.max(MIN_CANDIDATES),
        })
    }

    pub fn shared(self) -> SharedSessionStore {
        Arc::new(Mutex::new(self))
    }

    pub fn session(&self) -> &VotingSession {
        &self.state.session
    }

    pub fn is_session_created(&self) -> bool {
        self.state.session_created
    }

    pub fn candidate_count(&self) -> usize {
        self.state.candidates_count
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Replaces the stored session wholesale. The caller supplies a consistent record.
    pub fn create_session(&mut self, session: VotingSession) -> Result<()> {
        info!(
            "Storing voting session {} ({} candidates)",
            session.id,
            session.candidates.len()
        );
        let next = SessionState {
            session_created: true,
            candidates_count: session.candidates.len().max(MIN_CANDIDATES),
            session,
        };
        self.commit(next)
    }

    pub fn cancel_session_creation(&mut self) -> Result<()> {
        info!("Clearing voting session {}", self.state.session.id);
        self.storage.remove(SESSION_KEY)?;
        self.state = SessionState::default();
        Ok(())
    }

    pub fn set_session_created(&mut self, created: bool) -> Result<()> {
        let mut next = self.state.clone();
        next.session_created = created;
        self.commit(next)
    }

    pub fn increment_candidate_count(&mut self) -> Result<usize> {
        if self.state.candidates_count >= self.max_candidates {
            return Ok(self.state.candidates_count);
        }
        let mut next = self.state.clone();
        next.candidates_count += 1;
        self.commit(next)?;
        Ok(self.state.candidates_count)
    }

    pub fn decrement_candidate_count(&mut self) -> Result<usize> {
        if self.state.candidates_count <= MIN_CANDIDATES {
            return Ok(self.state.candidates_count);
        }
        let mut next = self.state.clone();
        next.candidates_count -= 1;
        self.commit(next)?;
        Ok(self.state.candidates_count)
    }

    /// Adds one vote to `candidate_id` and the session total. Not idempotent.
    /// Returns false when no candidate matched.
    pub fn vote(&mut self, candidate_id: u64) -> Result<bool> {
        let mut next = self.state.clone();
        let Some(candidate) = next
            .session
            .candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
        else {
            return Ok(false);
        };
        candidate.vote_count += 1;
        next.session.vote_count += 1;
        self.commit(next)?;
        Ok(true)
    }

    /// Overwrites one candidate's tally and recomputes the total.
    /// Returns false, leaving the store untouched, when the candidate is unknown.
    pub fn set_tally(&mut self, candidate_id: u64, vote_count: u64) -> Result<bool> {
        if self.state.session.candidate(candidate_id).is_none() {
            return Ok(false);
        }
        let mut next = self.state.clone();
        for candidate in next.session.candidates.iter_mut() {
            if candidate.id == candidate_id {
                candidate.vote_count = vote_count;
            }
        }
        next.session.recompute_totals();
        self.commit(next)?;
        Ok(true)
    }

    // storage first, so a failed write leaves memory as it was
    fn commit(&mut self, next: SessionState) -> Result<()> {
        let blob = serde_json::to_string(&next)?;
        self.storage.write(SESSION_KEY, &blob)?;
        self.state = next;
        Ok(())
    }
}
