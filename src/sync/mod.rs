//! Keeps the session store in agreement with the ledger: a historical catch-up on
//! start, then a sequential fold of live events.

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use std::future::Future;
use std::sync::{MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::ledger::Ledger;
use crate::error::Result;
use crate::models::events::{EventKind, LedgerEvent, LoggedEvent, VotingCreated};
use crate::models::session::VotingSession;
use crate::store::session::{SessionStore, SharedSessionStore};
use crate::websocket::{self, Subscription};

/// Source of live ledger events.
pub trait EventFeed {
    fn subscribe(
        &self,
        kinds: &[EventKind],
        sender: mpsc::UnboundedSender<LoggedEvent>,
    ) -> impl Future<Output = Result<Subscription>> + Send;
}

pub struct WsFeed {
    pub ws_url: String,
    pub contract: String,
}

impl EventFeed for WsFeed {
    async fn subscribe(
        &self,
        kinds: &[EventKind],
        sender: mpsc::UnboundedSender<LoggedEvent>,
    ) -> Result<Subscription> {
        websocket::subscribe(&self.ws_url, &self.contract, kinds, sender).await
    }
}

pub fn lock(store: &SharedSessionStore) -> MutexGuard<'_, SessionStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Session as of the latest creation, with every later vote folded in.
/// Each vote carries the absolute tally, so the last one per candidate wins.
pub fn reconstruct(
    created: &VotingCreated,
    created_at: (u64, u64),
    votes: &[LoggedEvent],
    now: DateTime<Utc>,
) -> VotingSession {
    let mut session = created.to_session();
    for logged in votes.iter().filter(|l| l.position() > created_at) {
        if let LedgerEvent::Voted {
            candidate_id,
            vote_count,
        } = logged.event
        {
            if let Some(c) = session
                .candidates
                .iter_mut()
                .find(|c| c.id == candidate_id)
            {
                c.vote_count = vote_count;
            }
        }
    }
    session.recompute_totals();
    session.refresh_status(now);
    session
}

/// Rebuilds the store from ledger history.
pub async fn hydrate<L: Ledger>(ledger: &L, store: &SharedSessionStore) -> Result<()> {
    let created = ledger.created_events().await?;

    let latest = created
        .iter()
        .filter_map(|l| match &l.event {
            LedgerEvent::VotingCreated(c) => Some((l.position(), c)),
            _ => None,
        })
        .max_by_key(|(position, _)| *position);

    let Some((position, payload)) = latest else {
        info!("No voting session on the ledger");
        return lock(store).cancel_session_creation();
    };

    let votes = ledger.voted_events(position.0).await?;
    let session = reconstruct(payload, position, &votes, Utc::now());
    info!(
        "Hydrated session {} from block {} with {} vote logs",
        session.id,
        position.0,
        votes.len()
    );
    lock(store).create_session(session)
}

/// Folds one live event into the store.
pub fn apply_event(store: &mut SessionStore, event: &LedgerEvent, now: DateTime<Utc>) -> Result<()> {
    match event {
        LedgerEvent::VotingCreated(created) => {
            let mut session = created.to_session();
            session.refresh_status(now);
            store.create_session(session)
        }
        LedgerEvent::Voted {
            candidate_id,
            vote_count,
        } => {
            if !store.set_tally(*candidate_id, *vote_count)? {
                debug!(
                    "Ignoring vote for unknown candidate {} (store not caught up)",
                    candidate_id
                );
            }
            Ok(())
        }
        LedgerEvent::VotingDeleted => store.cancel_session_creation(),
    }
}

/// Owns the live subscription and the task draining it into the store.
#[derive(Default)]
pub struct EventSync {
    started: bool,
    subscription: Option<Subscription>,
    drain: Option<JoinHandle<()>>,
}

impl EventSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Subscribes, catches up from history, then applies live events in delivery
    /// order. A second call while started does nothing.
    pub async fn start<L: Ledger, F: EventFeed>(
        &mut self,
        ledger: &L,
        feed: &F,
        store: SharedSessionStore,
    ) -> Result<()> {
        if self.started {
            debug!("Event sync already running");
            return Ok(());
        }

        // subscribe before the history query so nothing emitted in between is lost;
        // replays are harmless because every event carries absolute state
        let (sender, receiver) = mpsc::unbounded_channel();
        let subscription = feed.subscribe(&EventKind::ALL, sender).await?;

        if let Err(e) = hydrate(ledger, &store).await {
            error!("Failed to load voting history: {}", e);
            subscription.close();
            return Err(e);
        }

        self.drain = Some(tokio::spawn(drain(receiver, store)));
        self.subscription = Some(subscription);
        self.started = true;
        info!("Event sync started");
        Ok(())
    }

    /// Safe to call at any time, including before or after a failed `start`.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.close();
        }
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
        if self.started {
            info!("Event sync stopped");
        }
        self.started = false;
    }
}

impl Drop for EventSync {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<LoggedEvent>, store: SharedSessionStore) {
    while let Some(logged) = receiver.recv().await {
        let mut guard = lock(&store);
        if let Err(e) = apply_event(&mut guard, &logged.event, Utc::now()) {
            error!(
                "Failed to apply {} event: {}",
                logged.event.kind().as_str(),
                e
            );
        }
    }
    debug!("Event channel closed");
}
