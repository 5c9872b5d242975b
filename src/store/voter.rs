use log::{info, warn};
use std::sync::{Arc, Mutex};

use super::storage::Storage;
use crate::error::Result;
use crate::models::voter::VoterIdentity;

pub const VOTER_KEY: &str = "voter-store";

pub type SharedVoterStore = Arc<Mutex<VoterStore>>;

/// Holds the confirmed voter between eligibility check and vote.
pub struct VoterStore {
    storage: Arc<dyn Storage>,
    voter: Option<VoterIdentity>,
}

impl VoterStore {
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self> {
        let voter = match storage.read(VOTER_KEY)? {
            Some(blob) => serde_json::from_str::<VoterIdentity>(&blob)
                .map_err(|e| warn!("Discarding unreadable {VOTER_KEY} blob: {e}"))
                .ok(),
            None => None,
        };
        Ok(Self { storage, voter })
    }

    pub fn shared(self) -> SharedVoterStore {
        Arc::new(Mutex::new(self))
    }

    pub fn voter(&self) -> Option<&VoterIdentity> {
        self.voter.as_ref()
    }

    pub fn set_voter(
        &mut self,
        claimed_id: impl Into<String>,
        address: impl Into<String>,
        signing_key: impl Into<String>,
    ) -> Result<()> {
        let voter = VoterIdentity {
            claimed_id: claimed_id.into(),
            address: address.into(),
            signing_key: signing_key.into(),
        };
        self.storage
            .write(VOTER_KEY, &serde_json::to_string(&voter)?)?;
        info!("Voter {} confirmed", voter.claimed_id);
        self.voter = Some(voter);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(VOTER_KEY)?;
        self.voter = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;

    #[test]
    fn set_then_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = VoterStore::load(storage.clone()).unwrap();
        assert!(store.voter().is_none());

        store.set_voter("ueb0042", "0xabc", "k1").unwrap();
        store.set_voter("ueb0042", "0xdef", "k2").unwrap();

        let reloaded = VoterStore::load(storage.clone()).unwrap();
        assert_eq!(reloaded.voter().unwrap().address, "0xdef");

        store.clear().unwrap();
        assert!(store.voter().is_none());
        assert!(VoterStore::load(storage).unwrap().voter().is_none());
    }
}
