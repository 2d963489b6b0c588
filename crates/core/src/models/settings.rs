use serde::{Deserialize, Serialize};

use super::chain::Address;
use crate::errors::CoreError;

/// Sepolia, the network the vault is deployed to by default.
pub const DEFAULT_CHAIN_ID: u64 = 11_155_111;

/// Engine configuration.
///
/// Everything is optional in the sense that an absent `vault_address` is a
/// valid (degenerate) configuration: the engine then reports empty/zero
/// outputs without touching the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// JSON-RPC endpoint
    pub rpc_url: String,

    /// Target vault contract
    pub vault_address: Option<Address>,

    /// Connected account (share balance, approvals, writes)
    pub account: Option<Address>,

    pub chain_id: u64,

    /// Blocks covered by the historical fetch, including the latest block
    pub history_depth: u64,

    /// Maximum events retained in the working set
    pub event_capacity: usize,

    /// Maximum points in the price-per-share series
    pub price_points: usize,

    /// Maximum block timestamps remembered
    pub block_time_cache_size: usize,

    /// Live subscription polling interval
    pub poll_interval_ms: u64,

    /// Receipt polling interval while awaiting confirmation
    pub confirmation_poll_ms: u64,

    /// Receipt polls before giving up on a confirmation
    pub confirmation_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            vault_address: None,
            account: None,
            chain_id: DEFAULT_CHAIN_ID,
            history_depth: 10,
            event_capacity: 30,
            price_points: 12,
            block_time_cache_size: 256,
            poll_interval_ms: 4_000,
            confirmation_poll_ms: 1_000,
            confirmation_attempts: 120,
        }
    }
}

impl EngineConfig {
    /// Build a config from `VAULT_*` environment variables on top of the defaults.
    ///
    /// An empty `VAULT_ADDRESS` means "not configured", not an error.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = non_empty(lookup("VAULT_RPC_URL")) {
            config.rpc_url = url;
        }
        if let Some(addr) = non_empty(lookup("VAULT_ADDRESS")) {
            config.vault_address = Some(addr.parse()?);
        }
        if let Some(addr) = non_empty(lookup("VAULT_ACCOUNT")) {
            config.account = Some(addr.parse()?);
        }
        if let Some(id) = non_empty(lookup("VAULT_CHAIN_ID")) {
            config.chain_id = id
                .parse()
                .map_err(|_| CoreError::Config(format!("VAULT_CHAIN_ID '{id}' is not a number")))?;
        }
        if let Some(ms) = non_empty(lookup("VAULT_POLL_INTERVAL_MS")) {
            config.poll_interval_ms = ms.parse().map_err(|_| {
                CoreError::Config(format!("VAULT_POLL_INTERVAL_MS '{ms}' is not a number"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.history_depth == 0 {
            return Err(CoreError::Config("history_depth must be at least 1".into()));
        }
        if self.event_capacity == 0 {
            return Err(CoreError::Config("event_capacity must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(CoreError::Config("poll_interval_ms must be positive".into()));
        }
        Ok(())
    }

    /// Transaction link on the block explorer of the configured chain.
    pub fn explorer_tx_url(&self, tx: &str) -> Option<String> {
        let base = match self.chain_id {
            1 => "https://etherscan.io",
            DEFAULT_CHAIN_ID => "https://sepolia.etherscan.io",
            _ => return None,
        };
        Some(format!("{base}/tx/{tx}"))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
