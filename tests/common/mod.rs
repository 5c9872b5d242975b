#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use voting_dashboard::api::directory::VoterDirectory;
use voting_dashboard::api::images::ImageStore;
use voting_dashboard::api::ledger::{Ledger, NewCandidate};
use voting_dashboard::app::AppContext;
use voting_dashboard::config::Config;
use voting_dashboard::models::draft::ImageFile;
use voting_dashboard::models::events::{
    EventKind, LedgerCandidate, LedgerEvent, LoggedEvent, VotingCreated,
};
use voting_dashboard::models::rpc::Receipt;
use voting_dashboard::models::voter::VoterIdentity;
use voting_dashboard::store::MemoryStorage;
use voting_dashboard::sync::EventFeed;
use voting_dashboard::websocket::Subscription;
use voting_dashboard::{Error, Result};

pub mod stub;

pub fn config() -> Config {
    Config {
        rpc_url: "http://ledger".into(),
        ws_url: "ws://ledger".into(),
        contract_address: "0xC5".into(),
        admin_address: "0xad".into(),
        admin_key: Some("admin-key".into()),
        storage_dir: "unused".into(),
        image_store_url: "http://images".into(),
        image_store_key: None,
        image_bucket: "candidates".into(),
        directory_url: "http://directory".into(),
        max_candidates: 5,
    }
}

pub fn context() -> AppContext {
    AppContext::new(config(), Arc::new(MemoryStorage::new())).unwrap()
}

fn receipt(block: u64) -> Receipt {
    Receipt {
        transaction_hash: format!("0x{block:04x}"),
        block_number: block,
        status: 1,
    }
}

pub fn created(block: u64, voting_id: u64, names: &[&str]) -> LoggedEvent {
    let now = Utc::now().timestamp();
    LoggedEvent {
        block_number: block,
        log_index: 0,
        event: LedgerEvent::VotingCreated(VotingCreated {
            voting_id,
            start: now - 60,
            end: now + 3600,
            title: format!("Session {voting_id}"),
            candidates: names
                .iter()
                .enumerate()
                .map(|(i, name)| LedgerCandidate {
                    id: i as u64 + 1,
                    name: name.to_string(),
                    party: "Independent".into(),
                    image_url: format!("https://cdn/candidate_{}.png", i + 1),
                    vote_count: 0,
                })
                .collect(),
        }),
    }
}

pub fn voted(block: u64, candidate_id: u64, vote_count: u64) -> LoggedEvent {
    LoggedEvent {
        block_number: block,
        log_index: 0,
        event: LedgerEvent::Voted {
            candidate_id,
            vote_count,
        },
    }
}

pub fn deleted(block: u64) -> LoggedEvent {
    LoggedEvent {
        block_number: block,
        log_index: 0,
        event: LedgerEvent::VotingDeleted,
    }
}

/// In-memory ledger that is also its own event feed.
#[derive(Default)]
pub struct FakeLedger {
    pub history: Mutex<Vec<LoggedEvent>>,
    pub voters_who_voted: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<String>>,
    pub created_sessions: Mutex<Vec<(u64, String, Vec<NewCandidate>)>>,
    pub fail_history: AtomicBool,
    pub fail_vote: AtomicBool,
    pub vote_delay_ms: Mutex<u64>,
    pub subscribes: AtomicUsize,
    pub listeners: Mutex<Vec<(Vec<EventKind>, mpsc::UnboundedSender<LoggedEvent>)>>,
    pub shutdowns: Mutex<Vec<oneshot::Receiver<()>>>,
}

impl FakeLedger {
    pub fn with_history(events: Vec<LoggedEvent>) -> Self {
        let ledger = Self::default();
        *ledger.history.lock().unwrap() = events;
        ledger
    }

    /// Delivers a live event to every subscriber.
    pub fn emit(&self, event: LoggedEvent) {
        for (_, tx) in self.listeners.lock().unwrap().iter() {
            let _ = tx.send(event.clone());
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Ledger for FakeLedger {
    async fn create_session(
        &self,
        id: u64,
        title: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        candidates: &[NewCandidate],
    ) -> Result<Receipt> {
        self.record(format!("createVoting {id}"));
        self.created_sessions
            .lock()
            .unwrap()
            .push((id, title.to_owned(), candidates.to_vec()));
        Ok(receipt(1))
    }

    async fn vote(&self, candidate_id: u64, voter_address: &str, _voter_key: &str) -> Result<Receipt> {
        let delay = *self.vote_delay_ms.lock().unwrap();
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.record(format!("vote {candidate_id} {voter_address}"));
        if self.fail_vote.load(Ordering::SeqCst) {
            return Err(Error::Rejected("0xdead".into()));
        }
        self.voters_who_voted
            .lock()
            .unwrap()
            .push(voter_address.to_owned());
        Ok(receipt(2))
    }

    async fn start_immediately(&self, end: DateTime<Utc>) -> Result<Receipt> {
        self.record(format!("startVotingImmediately {}", end.timestamp()));
        Ok(receipt(3))
    }

    async fn delete_session(&self) -> Result<Receipt> {
        self.record("deleteVoting");
        Ok(receipt(4))
    }

    async fn check_has_voted(&self, voter_address: &str) -> Result<bool> {
        Ok(self
            .voters_who_voted
            .lock()
            .unwrap()
            .iter()
            .any(|a| a == voter_address))
    }

    async fn created_events(&self) -> Result<Vec<LoggedEvent>> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Error::MalformedResponse("node unreachable".into()));
        }
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.event.kind() == EventKind::VotingCreated)
            .cloned()
            .collect())
    }

    async fn voted_events(&self, from_block: u64) -> Result<Vec<LoggedEvent>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.event.kind() == EventKind::Voted && l.block_number >= from_block)
            .cloned()
            .collect())
    }
}

impl EventFeed for FakeLedger {
    async fn subscribe(
        &self,
        kinds: &[EventKind],
        sender: mpsc::UnboundedSender<LoggedEvent>,
    ) -> Result<Subscription> {
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().unwrap().push((kinds.to_vec(), sender));
        let (tx, rx) = oneshot::channel();
        self.shutdowns.lock().unwrap().push(rx);
        Ok(Subscription::new(tx))
    }
}

#[derive(Default)]
pub struct FakeDirectory {
    pub entries: HashMap<String, (String, String)>,
}

impl FakeDirectory {
    pub fn with(claimed_id: &str, address: &str, key: &str) -> Self {
        let mut entries = HashMap::new();
        entries.insert(claimed_id.to_owned(), (address.to_owned(), key.to_owned()));
        Self { entries }
    }
}

impl VoterDirectory for FakeDirectory {
    async fn lookup(&self, claimed_id: &str) -> Result<VoterIdentity> {
        match self.entries.get(claimed_id) {
            Some((address, key)) => Ok(VoterIdentity {
                claimed_id: claimed_id.to_owned(),
                address: address.clone(),
                signing_key: key.clone(),
            }),
            None => Err(Error::IdentityNotFound(claimed_id.to_owned())),
        }
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub fail: AtomicBool,
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl ImageStore for FakeImages {
    async fn upload(&self, file: &ImageFile, candidate_id: u64, batch_id: &str) -> Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::MalformedResponse("storage offline".into()));
        }
        let url = format!(
            "https://cdn/candidate_{candidate_id}_{batch_id}.{}",
            file.extension()
        );
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, image_urls: &[String]) -> Result<()> {
        self.deleted.lock().unwrap().extend_from_slice(image_urls);
        Ok(())
    }
}

/// Polls `check` until it holds or a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
