use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::PoisonError;

use crate::api::directory::VoterDirectory;
use crate::api::images::{upload_candidate_images, ImageStore};
use crate::api::ledger::Ledger;
use crate::error::{Error, Result};
use crate::models::draft::{DraftIssue, SessionDraft};
use crate::models::rpc::Receipt;
use crate::models::session::SessionStatus;
use crate::models::voter::{validate_voter_id, VoterIdentity};
use crate::store::{SharedSessionStore, SharedVoterStore};
use crate::sync::lock;

/// The single-vote path: confirm who is voting, then submit once.
pub struct VoteFlow<'a, L, D> {
    ledger: &'a L,
    directory: &'a D,
    session: SharedSessionStore,
    voter: SharedVoterStore,
    in_flight: AtomicBool,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<'a, L: Ledger, D: VoterDirectory> VoteFlow<'a, L, D> {
    pub fn new(
        ledger: &'a L,
        directory: &'a D,
        session: SharedSessionStore,
        voter: SharedVoterStore,
    ) -> Self {
        Self {
            ledger,
            directory,
            session,
            voter,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Looks the voter up and refuses anyone who already voted. Nothing is stored
    /// unless both checks pass.
    pub async fn confirm_voter(&self, claimed_id: &str) -> Result<VoterIdentity> {
        let claimed_id = validate_voter_id(claimed_id)?;
        let identity = self.directory.lookup(claimed_id).await?;

        if self.ledger.check_has_voted(&identity.address).await? {
            info!("Voter {} has already voted", claimed_id);
            return Err(Error::AlreadyVoted);
        }

        self.voter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_voter(
                identity.claimed_id.as_str(),
                identity.address.as_str(),
                identity.signing_key.as_str(),
            )?;
        Ok(identity)
    }

    /// Casts the confirmed voter's ballot. The tally is not touched here; it changes
    /// when the ledger's `Voted` event comes back.
    pub async fn submit(&self, candidate_id: u64) -> Result<Receipt> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Vote already in flight, ignoring resubmit");
            return Err(Error::VoteInFlight);
        }
        let _in_flight = InFlight(&self.in_flight);

        let voter = self
            .voter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .voter()
            .cloned()
            .ok_or(Error::NoVoter)?;

        {
            let store = lock(&self.session);
            let session = store.session();
            if session.is_empty() {
                return Err(Error::NoSession);
            }
            match session.status_at(Utc::now()) {
                Some(SessionStatus::Ongoing) => {}
                Some(status) => return Err(Error::VotingNotOpen(status.as_str())),
                None => return Err(Error::VotingNotOpen("unscheduled")),
            }
            if session.candidate(candidate_id).is_none() {
                return Err(Error::UnknownCandidate(candidate_id));
            }
        }

        let receipt = self
            .ledger
            .vote(candidate_id, &voter.address, &voter.signing_key)
            .await?;
        info!("Vote by {} recorded", voter.claimed_id);
        // the vote is on the ledger; a stale voter record must not hide the receipt
        if let Err(e) = self.dismiss() {
            warn!("Vote recorded but clearing the voter failed: {}", e);
        }
        Ok(receipt)
    }

    /// Dialog closed: forget the voter.
    pub fn dismiss(&self) -> Result<()> {
        self.voter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Created { id: u64, receipt: Receipt },
    Invalid(Vec<DraftIssue>),
    /// Shown inline next to a re-enabled submit button.
    Failed(String),
}

/// Admin actions on the ledger.
pub struct AdminFlow<'a, L, I> {
    ledger: &'a L,
    images: &'a I,
    session: SharedSessionStore,
}

impl<'a, L: Ledger, I: ImageStore> AdminFlow<'a, L, I> {
    pub fn new(ledger: &'a L, images: &'a I, session: SharedSessionStore) -> Self {
        Self {
            ledger,
            images,
            session,
        }
    }

    /// Validates, uploads every image, then creates the session on the ledger.
    /// Failures come back as an outcome rather than an error.
    pub async fn create(&self, draft: &SessionDraft, now: DateTime<Utc>) -> SubmissionOutcome {
        let max = lock(&self.session).max_candidates();
        let issues = draft.validate(now, max);
        if !issues.is_empty() {
            return SubmissionOutcome::Invalid(issues);
        }
        let (Some(start), Some(end)) = (draft.start, draft.end) else {
            return SubmissionOutcome::Invalid(Vec::new());
        };

        let id = now.timestamp_millis() as u64;
        let batch_id = id.to_string();
        let result = async {
            let candidates = upload_candidate_images(self.images, &draft.candidates, &batch_id).await?;
            self.ledger
                .create_session(id, draft.title.trim(), start, end, &candidates)
                .await
        }
        .await;

        match result {
            Ok(receipt) => {
                info!("Voting session {} created", id);
                SubmissionOutcome::Created { id, receipt }
            }
            Err(e) => {
                error!("Failed to create voting session: {}", e);
                SubmissionOutcome::Failed(e.to_string())
            }
        }
    }

    pub async fn start_now(&self, end: DateTime<Utc>) -> Result<Receipt> {
        self.ledger.start_immediately(end).await
    }

    /// Deletes the session on the ledger, then its images. Image cleanup failures are
    /// only logged.
    pub async fn delete(&self) -> Result<Receipt> {
        let image_urls: Vec<String> = lock(&self.session)
            .session()
            .candidates
            .iter()
            .map(|c| c.image_url.clone())
            .filter(|url| !url.is_empty())
            .collect();

        let receipt = self.ledger.delete_session().await?;
        if let Err(e) = self.images.delete(&image_urls).await {
            warn!("Session deleted but images were left behind: {}", e);
        }
        Ok(receipt)
    }
}
