use log::{debug, error, info};
use reqwest::{Client, StatusCode};
use std::future::Future;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::voter::{DirectoryEntry, VoterIdentity};

/// Maps a claimed voter id to its ledger account.
pub trait VoterDirectory {
    fn lookup(&self, claimed_id: &str) -> impl Future<Output = Result<VoterIdentity>> + Send;
}

pub struct HttpDirectory {
    client: Client,
    base_url: String,
}

impl HttpDirectory {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.directory_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl VoterDirectory for HttpDirectory {
    async fn lookup(&self, claimed_id: &str) -> Result<VoterIdentity> {
        debug!("Looking up voter {}", claimed_id);
        let url = format!("{}/voters/{}", self.base_url, claimed_id);
        let resp = self.client.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            info!("Voter {} not in directory", claimed_id);
            return Err(Error::IdentityNotFound(claimed_id.to_owned()));
        }
        if !resp.status().is_success() {
            error!("Directory lookup failed: {}", resp.status());
            return Err(Error::MalformedResponse(format!(
                "directory returned HTTP {}",
                resp.status()
            )));
        }

        let entry = resp.json::<DirectoryEntry>().await?;
        Ok(VoterIdentity {
            claimed_id: claimed_id.to_owned(),
            address: entry.address,
            signing_key: entry.private_key,
        })
    }
}
