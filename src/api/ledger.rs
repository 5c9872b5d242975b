use chrono::{DateTime, Utc};
use log::{debug, error, info};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::events::{EventKind, LoggedEvent};
use crate::models::rpc::{CallParams, GetEventsParams, Receipt, RpcRequest, RpcResponse, SendParams};

/// Candidate as entered by the admin, after its image was uploaded.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
    pub name: String,
    pub party: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

/// Calls into the voting contract. Every transaction resolves only once confirmed;
/// an error means no state changed on the ledger.
pub trait Ledger {
    fn create_session(
        &self,
        id: u64,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        candidates: &[NewCandidate],
    ) -> impl Future<Output = Result<Receipt>> + Send;

    fn vote(
        &self,
        candidate_id: u64,
        voter_address: &str,
        voter_key: &str,
    ) -> impl Future<Output = Result<Receipt>> + Send;

    fn start_immediately(&self, end: DateTime<Utc>) -> impl Future<Output = Result<Receipt>> + Send;

    fn delete_session(&self) -> impl Future<Output = Result<Receipt>> + Send;

    fn check_has_voted(&self, voter_address: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Every `VotingCreated` log, oldest first.
    fn created_events(&self) -> impl Future<Output = Result<Vec<LoggedEvent>>> + Send;

    /// `Voted` logs from `from_block` onward, oldest first.
    fn voted_events(&self, from_block: u64)
        -> impl Future<Output = Result<Vec<LoggedEvent>>> + Send;
}

/// Candidate list in the shape the contract stores: ids from 1, zero tallies.
pub fn contract_candidates(candidates: &[NewCandidate]) -> Value {
    Value::Array(
        candidates
            .iter()
            .enumerate()
            .map(|(index, c)| {
                json!({
                    "id": index as u64 + 1,
                    "name": c.name,
                    "party": c.party,
                    "imageUrl": c.image_url,
                    "voteCount": 0,
                })
            })
            .collect(),
    )
}

pub struct JsonRpcLedger {
    client: Client,
    rpc_url: String,
    contract: String,
    admin_address: String,
    admin_key: Option<String>,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            rpc_url: config.rpc_url.clone(),
            contract: config.contract_address.clone(),
            admin_address: config.admin_address.clone(),
            admin_key: config.admin_key.clone(),
            next_id: AtomicU64::new(1),
        }
    }

    async fn request<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: P) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        debug!("RPC {} #{}", method, id);
        let resp = self.client.post(&self.rpc_url).json(&request).send().await?;

        if !resp.status().is_success() {
            error!("RPC {} failed with HTTP {}", method, resp.status());
            return Err(Error::MalformedResponse(format!("HTTP {}", resp.status())));
        }

        let response = resp.json::<RpcResponse<T>>().await?;
        if let Some(err) = response.error {
            error!("RPC {} returned error {}: {}", method, err.code, err.message);
            return Err(Error::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        response
            .result
            .ok_or_else(|| Error::MalformedResponse(format!("{method} returned no result")))
    }

    async fn send(&self, function: &str, args: Value, signer: &str) -> Result<Receipt> {
        let receipt: Receipt = self
            .request(
                "contract_send",
                SendParams {
                    contract: &self.contract,
                    function,
                    args,
                    signer,
                },
            )
            .await?;
        if receipt.status == 0 {
            error!("{} reverted in tx {}", function, receipt.transaction_hash);
            return Err(Error::Rejected(receipt.transaction_hash));
        }
        info!(
            "{} confirmed in block {} ({})",
            function, receipt.block_number, receipt.transaction_hash
        );
        Ok(receipt)
    }

    async fn call<T: DeserializeOwned>(&self, function: &str, args: Value) -> Result<T> {
        self.request(
            "contract_call",
            CallParams {
                contract: &self.contract,
                function,
                args,
            },
        )
        .await
    }

    async fn events(&self, kind: EventKind, from_block: u64) -> Result<Vec<LoggedEvent>> {
        let mut logs: Vec<LoggedEvent> = self
            .request(
                "contract_getEvents",
                GetEventsParams {
                    contract: &self.contract,
                    event: kind.as_str(),
                    from_block,
                },
            )
            .await?;
        logs.sort_by_key(LoggedEvent::position);
        debug!("Fetched {} {} logs", logs.len(), kind.as_str());
        Ok(logs)
    }

    fn admin_key(&self) -> Result<&str> {
        self.admin_key.as_deref().ok_or(Error::MissingAdminKey)
    }

    async fn verify_admin(&self) -> Result<()> {
        let on_chain: String = self.call("admin", json!([])).await?;
        if !on_chain.eq_ignore_ascii_case(&self.admin_address) {
            return Err(Error::WrongAdminKey(on_chain));
        }
        Ok(())
    }
}

impl Ledger for JsonRpcLedger {
    async fn create_session(
        &self,
        id: u64,
        title: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        candidates: &[NewCandidate],
    ) -> Result<Receipt> {
        let key = self.admin_key()?;
        let args = json!([
            id,
            title,
            start.timestamp(),
            end.timestamp(),
            contract_candidates(candidates)
        ]);
        self.send("createVoting", args, key).await
    }

    async fn vote(&self, candidate_id: u64, voter_address: &str, voter_key: &str) -> Result<Receipt> {
        self.send("vote", json!([candidate_id, voter_address]), voter_key)
            .await
    }

    async fn start_immediately(&self, end: DateTime<Utc>) -> Result<Receipt> {
        let key = self.admin_key()?;
        self.verify_admin().await?;
        self.send("startVotingImmediately", json!([end.timestamp()]), key)
            .await
    }

    async fn delete_session(&self) -> Result<Receipt> {
        let key = self.admin_key()?;
        self.verify_admin().await?;
        self.send("deleteVoting", json!([]), key).await
    }

    async fn check_has_voted(&self, voter_address: &str) -> Result<bool> {
        self.call("checkVote", json!([voter_address])).await
    }

    async fn created_events(&self) -> Result<Vec<LoggedEvent>> {
        self.events(EventKind::VotingCreated, 0).await
    }

    async fn voted_events(&self, from_block: u64) -> Result<Vec<LoggedEvent>> {
        self.events(EventKind::Voted, from_block).await
    }
}
