use log::{info, warn};
use std::{env, fmt::Display, path::PathBuf, str::FromStr};

#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub ws_url: String,
    pub contract_address: String,
    pub admin_address: String,
    pub admin_key: Option<String>,
    pub storage_dir: PathBuf,
    pub image_store_url: String,
    pub image_store_key: Option<String>,
    pub image_bucket: String,
    pub directory_url: String,
    pub max_candidates: usize,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            rpc_url: try_load("VOTING_RPC_URL", "http://127.0.0.1:9545")?,
            ws_url: try_load("VOTING_WS_URL", "ws://127.0.0.1:9545")?,
            contract_address: try_load(
                "VOTING_CONTRACT_ADDRESS",
                "0xC51b7a92b23b5cf986829969277EB8E069E8Af2c",
            )?,
            admin_address: try_load(
                "VOTING_ADMIN_ADDRESS",
                "0xe6de4c5c30077e36ef9b853ebedfffded0b8b65e",
            )?,
            admin_key: secret("VOTING_ADMIN_KEY"),
            storage_dir: try_load("VOTING_STORAGE_DIR", ".voting-dashboard")?,
            image_store_url: try_load("VOTING_IMAGE_STORE_URL", "http://127.0.0.1:54321")?,
            image_store_key: secret("VOTING_IMAGE_STORE_KEY"),
            image_bucket: try_load("VOTING_IMAGE_BUCKET", "candidates")?,
            directory_url: try_load("VOTING_DIRECTORY_URL", "http://127.0.0.1:8080")?,
            max_candidates: try_load("VOTING_MAX_CANDIDATES", "20")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("Environment misconfigured: invalid {key}")
    })
}

fn secret(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        _ => {
            warn!("{key} not set");
            None
        }
    }
}
