use log::{debug, info};
use std::sync::Arc;

use crate::api::ledger::Ledger;
use crate::config::Config;
use crate::error::Result;
use crate::models::draft::SessionDraft;
use crate::models::session::VotingSession;
use crate::store::{FileStorage, SessionStore, SharedSessionStore, SharedVoterStore, Storage, VoterStore};
use crate::sync::{lock, EventFeed, EventSync};

pub mod flows;

pub use flows::{AdminFlow, SubmissionOutcome, VoteFlow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Session(VotingSession),
    NotFound,
}

/// Built once at startup and handed to whoever needs the stores.
pub struct AppContext {
    pub config: Config,
    pub session: SharedSessionStore,
    pub voter: SharedVoterStore,
    sync: EventSync,
}

impl AppContext {
    pub fn new(config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let session = SessionStore::load(storage.clone(), config.max_candidates)?.shared();
        let voter = VoterStore::load(storage)?.shared();
        Ok(Self {
            config,
            session,
            voter,
            sync: EventSync::new(),
        })
    }

    pub fn open(config: Config) -> anyhow::Result<Self> {
        let storage = FileStorage::open(&config.storage_dir)?;
        Ok(Self::new(config, Arc::new(storage))?)
    }

    pub async fn start_sync<L: Ledger, F: EventFeed>(&mut self, ledger: &L, feed: &F) -> Result<()> {
        self.sync.start(ledger, feed, self.session.clone()).await
    }

    pub fn stop_sync(&mut self) {
        self.sync.stop();
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_started()
    }

    /// Signing out drops whatever session was on display.
    pub fn on_auth_change(&self, signed_in: bool) -> Result<()> {
        debug!("Signed in: {}", signed_in);
        if signed_in {
            return Ok(());
        }
        info!("Signed out, clearing voting session");
        lock(&self.session).cancel_session_creation()
    }

    pub fn current_session(&self) -> VotingSession {
        lock(&self.session).session().clone()
    }

    /// Blank creation form sized from the staging count.
    pub fn draft(&self) -> SessionDraft {
        SessionDraft::with_count(lock(&self.session).candidate_count())
    }

    pub fn increment_candidate_count(&self) -> Result<usize> {
        lock(&self.session).increment_candidate_count()
    }

    pub fn decrement_candidate_count(&self) -> Result<usize> {
        lock(&self.session).decrement_candidate_count()
    }

    pub fn cancel_session_creation(&self) -> Result<()> {
        lock(&self.session).cancel_session_creation()
    }

    pub fn resolve_route(&self, path_id: &str) -> Route {
        resolve_route(&lock(&self.session), path_id)
    }
}

/// A session page resolves only when the path id names the stored session.
pub fn resolve_route(store: &SessionStore, path_id: &str) -> Route {
    let session = store.session();
    match path_id.trim().parse::<u64>() {
        Ok(id) if store.is_session_created() && !session.is_empty() && session.id == id => {
            Route::Session(session.clone())
        }
        _ => Route::NotFound,
    }
}
