use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

const VOTER_ID_PREFIX: &str = "ueb";
const VOTER_ID_MIN_LEN: usize = 6;

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VoterIdentity {
    #[serde(rename = "claimedId")]
    pub claimed_id: String,
    pub address: String,
    #[serde(rename = "signingKey")]
    pub signing_key: String,
}

impl fmt::Debug for VoterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoterIdentity")
            .field("claimed_id", &self.claimed_id)
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .finish()
    }
}

/// Student ids look like `UEB123...`; the prefix is matched case-insensitively.
pub fn validate_voter_id(claimed_id: &str) -> Result<&str> {
    let id = claimed_id.trim();
    if id.len() < VOTER_ID_MIN_LEN {
        return Err(Error::InvalidVoterId("Voting ID is required".to_owned()));
    }
    if !id.to_lowercase().starts_with(VOTER_ID_PREFIX) {
        return Err(Error::InvalidVoterId("Invalid Voting ID".to_owned()));
    }
    Ok(id)
}

#[derive(Deserialize, Debug)]
pub struct DirectoryEntry {
    pub address: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}
