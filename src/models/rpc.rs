use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::LoggedEvent;

#[derive(Serialize, Debug)]
pub struct RpcRequest<'a, P: Serialize> {
    pub jsonrpc: &'a str,
    pub id: u64,
    pub method: &'a str,
    pub params: P,
}

impl<'a, P: Serialize> RpcRequest<'a, P> {
    pub fn new(id: u64, method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct RpcResponse<T> {
    pub id: Option<u64>,
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Serialize, Debug)]
pub struct SendParams<'a> {
    pub contract: &'a str,
    pub function: &'a str,
    pub args: Value,
    pub signer: &'a str,
}

#[derive(Serialize, Debug)]
pub struct CallParams<'a> {
    pub contract: &'a str,
    pub function: &'a str,
    pub args: Value,
}

#[derive(Serialize, Debug)]
pub struct GetEventsParams<'a> {
    pub contract: &'a str,
    pub event: &'a str,
    #[serde(rename = "fromBlock")]
    pub from_block: u64,
}

#[derive(Serialize, Debug)]
pub struct SubscribeParams<'a> {
    pub contract: &'a str,
    pub events: Vec<&'a str>,
}

/// Confirmed transaction. `status == 0` means the ledger reverted it.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    #[serde(rename = "transactionHash")]
    pub transaction_hash: String,
    #[serde(rename = "blockNumber")]
    pub block_number: u64,
    pub status: u8,
}

#[derive(Deserialize, Debug)]
pub struct SubscriptionParams {
    pub subscription: String,
    pub result: LoggedEvent,
}

/// Frames arriving on the ledger WebSocket.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum WsFrame {
    Notification {
        method: String,
        params: SubscriptionParams,
    },
    Response(RpcResponse<Value>),
}
