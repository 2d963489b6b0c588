use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::abi;
use super::traits::{ChainClient, LogSubscription};
use crate::errors::CoreError;
use crate::models::chain::{
    Address, BlockHeader, CallValue, LogEntry, TxHash, TxReceipt, TxStatus, ViewCall, WriteCall,
};
use crate::models::event::EventKind;
use crate::models::settings::EngineConfig;

/// Batches buffered per subscription before the poller waits on the consumer.
const SUBSCRIPTION_BUFFER: usize = 64;

/// Ethereum JSON-RPC client over HTTP.
///
/// - **Reads**: `eth_blockNumber`, `eth_getLogs`, `eth_getBlockByNumber`, `eth_call`.
/// - **Live logs**: HTTP has no push channel, so `subscribe` polls `eth_getLogs`
///   over each new block range and forwards non-empty batches.
/// - **Writes**: `eth_sendTransaction` from the configured sender (the node or
///   wallet bridge behind the endpoint holds the key), then receipt polling.
#[derive(Clone)]
pub struct JsonRpcClient {
    client: Client,
    url: String,
    sender: Option<Address>,
    poll_interval: Duration,
    confirmation_poll: Duration,
    confirmation_attempts: u32,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        let defaults = EngineConfig::default();
        Self {
            client,
            url: url.into(),
            sender: None,
            poll_interval: Duration::from_millis(defaults.poll_interval_ms),
            confirmation_poll: Duration::from_millis(defaults.confirmation_poll_ms),
            confirmation_attempts: defaults.confirmation_attempts,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        let mut rpc = Self::new(config.rpc_url.clone());
        rpc.sender = config.account.clone();
        rpc.poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));
        rpc.confirmation_poll = Duration::from_millis(config.confirmation_poll_ms.max(1));
        rpc.confirmation_attempts = config.confirmation_attempts;
        rpc
    }

    pub fn with_sender(mut self, sender: Option<Address>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, CoreError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let resp: RpcResponse<T> = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Rpc {
                method: method.to_string(),
                message: format!("Failed to parse response: {e}"),
            })?;

        if let Some(err) = resp.error {
            return Err(CoreError::Rpc {
                method: method.to_string(),
                message: format!("{} (code {})", err.message, err.code),
            });
        }
        Ok(resp.result)
    }

    async fn request_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, CoreError> {
        self.request(method, params).await?.ok_or_else(|| CoreError::Rpc {
            method: method.to_string(),
            message: "empty result".into(),
        })
    }
}

// ── JSON-RPC wire types ─────────────────────────────────────────────

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    topics: Vec<String>,
    data: String,
    block_number: Option<String>,
    transaction_hash: Option<String>,
    log_index: Option<String>,
    #[serde(default)]
    removed: bool,
}

#[derive(Deserialize)]
struct RpcBlock {
    timestamp: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    block_number: String,
    status: Option<String>,
}

fn parse_quantity(text: &str) -> Result<u64, CoreError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map_err(|e| CoreError::Decode(format!("invalid quantity '{text}': {e}")))
}

fn quantity(n: u64) -> String {
    format!("0x{n:x}")
}

fn block_tag(at_block: Option<u64>) -> String {
    at_block.map_or_else(|| "latest".to_string(), quantity)
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    fn name(&self) -> &str {
        "JSON-RPC"
    }

    async fn current_block_height(&self) -> Result<u64, CoreError> {
        let height: String = self.request_required("eth_blockNumber", json!([])).await?;
        parse_quantity(&height)
    }

    async fn query_logs(
        &self,
        address: &Address,
        kind: EventKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, CoreError> {
        let filter = json!([{
            "address": address.as_str(),
            "topics": [abi::event_topic(kind)],
            "fromBlock": quantity(from),
            "toBlock": quantity(to),
        }]);
        let raw: Vec<RpcLog> = self.request("eth_getLogs", filter).await?.unwrap_or_default();

        let mut logs = Vec::with_capacity(raw.len());
        for log in raw.into_iter().filter(|l| !l.removed) {
            let block_number = log.block_number.as_deref().map(parse_quantity).transpose()?;
            let log_index = log.log_index.as_deref().map(parse_quantity).transpose()?;
            match abi::decode_log(
                &log.address,
                &log.topics,
                &log.data,
                log.transaction_hash.as_deref(),
                block_number,
                log_index,
            ) {
                Ok(entry) => logs.push(entry),
                Err(e) => warn!(error = %e, "skipping undecodable {kind} log"),
            }
        }
        Ok(logs)
    }

    async fn get_block(&self, height: u64) -> Result<BlockHeader, CoreError> {
        let block: Option<RpcBlock> = self
            .request("eth_getBlockByNumber", json!([quantity(height), false]))
            .await?;
        let block = block.ok_or(CoreError::BlockNotFound(height))?;
        Ok(BlockHeader {
            height,
            timestamp: parse_quantity(&block.timestamp)? as i64,
        })
    }

    async fn read_call(
        &self,
        address: &Address,
        call: &ViewCall,
        at_block: Option<u64>,
    ) -> Result<CallValue, CoreError> {
        let params = json!([
            { "to": address.as_str(), "data": abi::encode_view(call) },
            block_tag(at_block),
        ]);
        let data: String = self.request_required("eth_call", params).await?;
        abi::decode_return(call, &data)
    }

    async fn subscribe(
        &self,
        address: &Address,
        kind: EventKind,
        from_block: u64,
    ) -> Result<LogSubscription, CoreError> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let client = self.clone();
        let address = address.clone();
        let mut next_from = from_block;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let latest = match client.current_block_height().await {
                    Ok(h) => h,
                    Err(e) => {
                        warn!(error = %e, "{kind} poll: block height unavailable");
                        continue;
                    }
                };
                if latest < next_from {
                    continue;
                }
                match client.query_logs(&address, kind, next_from, latest).await {
                    Ok(logs) => {
                        next_from = latest + 1;
                        if logs.is_empty() {
                            continue;
                        }
                        if tx.send(logs).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, from = next_from, to = latest, "{kind} poll failed"),
                }
            }
            debug!(%address, "{kind} subscription closed");
        });

        Ok(LogSubscription::new(rx))
    }

    async fn submit_transaction(
        &self,
        address: &Address,
        call: &WriteCall,
    ) -> Result<TxHash, CoreError> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| CoreError::Config("no sender account configured".into()))?;
        let params = json!([{
            "from": sender.as_str(),
            "to": address.as_str(),
            "data": abi::encode_write(call),
        }]);
        let hash: String = self.request_required("eth_sendTransaction", params).await?;
        Ok(TxHash(hash))
    }

    async fn await_confirmation(&self, tx: &TxHash) -> Result<TxReceipt, CoreError> {
        for _ in 0..self.confirmation_attempts.max(1) {
            let receipt: Option<RpcReceipt> = self
                .request("eth_getTransactionReceipt", json!([tx.0]))
                .await?;
            if let Some(receipt) = receipt {
                let status = match receipt.status.as_deref() {
                    Some("0x0") => TxStatus::Reverted,
                    _ => TxStatus::Success,
                };
                return Ok(TxReceipt {
                    transaction_id: TxHash(receipt.transaction_hash),
                    block_height: parse_quantity(&receipt.block_number)?,
                    status,
                });
            }
            tokio::time::sleep(self.confirmation_poll).await;
        }
        Err(CoreError::Rpc {
            method: "eth_getTransactionReceipt".into(),
            message: format!(
                "{tx} not confirmed after {} polls",
                self.confirmation_attempts
            ),
        })
    }
}
