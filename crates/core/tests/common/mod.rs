// ═══════════════════════════════════════════════════════════════════
// Shared test helpers — deterministic in-memory ChainClient
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use vault_lens_core::errors::CoreError;
use vault_lens_core::models::chain::{
    Address, BlockHeader, CallValue, LogEntry, TxHash, TxReceipt, TxStatus, ViewCall, WriteCall,
};
use vault_lens_core::models::event::{EventKind, VaultEvent};
use vault_lens_core::models::settings::EngineConfig;
use vault_lens_core::providers::traits::{ChainClient, LogSubscription};

/// 2025-03-04 12:00:00 UTC
pub const MAR_4_NOON: i64 = 1_741_089_600;
pub const DAY: i64 = 86_400;

pub type Responder = Box<dyn Fn(&Address, &ViewCall, Option<u64>) -> Result<CallValue, CoreError> + Send + Sync>;

/// Address `0x0000…00nn`.
pub fn addr(n: u8) -> Address {
    format!("0x{n:040x}").parse().expect("valid test address")
}

pub fn vault_a() -> Address {
    addr(0xa)
}

pub fn vault_b() -> Address {
    addr(0xb)
}

/// One whole token with 18 decimals, times `n`.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn log(vault: &Address, kind: EventKind, block: u64, position: u64, assets: U256) -> LogEntry {
    LogEntry {
        address: vault.clone(),
        kind,
        initiator: addr(1),
        owner: addr(2),
        beneficiary: match kind {
            EventKind::Inflow => None,
            EventKind::Outflow => Some(addr(3)),
        },
        asset_amount: assets,
        share_amount: assets,
        transaction_id: TxHash(format!("0x{block:04x}{position:04x}")),
        block_height: Some(block),
        log_position: Some(position),
    }
}

pub fn deposit_log(vault: &Address, block: u64, position: u64, assets: U256) -> LogEntry {
    log(vault, EventKind::Inflow, block, position, assets)
}

pub fn withdraw_log(vault: &Address, block: u64, position: u64, assets: U256) -> LogEntry {
    log(vault, EventKind::Outflow, block, position, assets)
}

pub fn event(kind: EventKind, block: u64, position: u64, assets: U256, observed_at: i64) -> VaultEvent {
    VaultEvent::from_log(log(&vault_a(), kind, block, position, assets), observed_at)
        .expect("confirmed log")
}

pub fn test_config() -> EngineConfig {
    EngineConfig {
        vault_address: Some(vault_a()),
        ..EngineConfig::default()
    }
}

fn unmocked(_: &Address, call: &ViewCall, _: Option<u64>) -> Result<CallValue, CoreError> {
    Err(CoreError::Rpc {
        method: "eth_call".into(),
        message: format!("{} not mocked", call.name()),
    })
}

/// In-memory chain: a fixed head, a log table, block timestamps and a
/// pluggable view-call responder. Every trait method is counted.
pub struct MockChainClient {
    pub height: Mutex<u64>,
    pub logs: Mutex<Vec<LogEntry>>,
    pub block_times: Mutex<HashMap<u64, i64>>,
    pub responder: Mutex<Responder>,

    pub fail_head: Mutex<bool>,
    pub fail_logs: Mutex<bool>,
    /// When set, the next `current_block_height` waits for a notification
    pub head_gate: Mutex<Option<Arc<Notify>>>,

    pub subscribers: Mutex<Vec<(EventKind, mpsc::Sender<Vec<LogEntry>>)>>,
    /// First block requested by each `subscribe` call
    pub subscribed_from: Mutex<Vec<(EventKind, u64)>>,

    pub submitted: Mutex<Vec<(Address, WriteCall)>>,
    pub submit_error: Mutex<Option<String>>,
    pub receipt_status: Mutex<TxStatus>,

    pub head_calls: AtomicUsize,
    pub log_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub read_calls: AtomicUsize,
    pub read_log: Mutex<Vec<(ViewCall, Option<u64>)>>,
}

impl MockChainClient {
    pub fn new(height: u64) -> Self {
        Self {
            height: Mutex::new(height),
            logs: Mutex::new(Vec::new()),
            block_times: Mutex::new(HashMap::new()),
            responder: Mutex::new(Box::new(unmocked)),
            fail_head: Mutex::new(false),
            fail_logs: Mutex::new(false),
            head_gate: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
            subscribed_from: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
            submit_error: Mutex::new(None),
            receipt_status: Mutex::new(TxStatus::Success),
            head_calls: AtomicUsize::new(0),
            log_calls: AtomicUsize::new(0),
            block_calls: AtomicUsize::new(0),
            read_calls: AtomicUsize::new(0),
            read_log: Mutex::new(Vec::new()),
        }
    }

    pub fn with_logs(self, logs: Vec<LogEntry>) -> Self {
        *self.logs.lock() = logs;
        self
    }

    /// Every block in `range` gets `start + (height - range.start) * step`.
    pub fn with_block_times(self, range: std::ops::RangeInclusive<u64>, start: i64, step: i64) -> Self {
        {
            let first = *range.start();
            let mut times = self.block_times.lock();
            for height in range {
                times.insert(height, start + (height - first) as i64 * step);
            }
        }
        self
    }

    pub fn with_responder<F>(self, responder: F) -> Self
    where
        F: Fn(&Address, &ViewCall, Option<u64>) -> Result<CallValue, CoreError> + Send + Sync + 'static,
    {
        *self.responder.lock() = Box::new(responder);
        self
    }

    pub fn set_responder<F>(&self, responder: F)
    where
        F: Fn(&Address, &ViewCall, Option<u64>) -> Result<CallValue, CoreError> + Send + Sync + 'static,
    {
        *self.responder.lock() = Box::new(responder);
    }

    pub fn total_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
            + self.log_calls.load(Ordering::SeqCst)
            + self.block_calls.load(Ordering::SeqCst)
            + self.read_calls.load(Ordering::SeqCst)
    }

    pub fn reads_of(&self, name: &str) -> Vec<Option<u64>> {
        self.read_log
            .lock()
            .iter()
            .filter(|(call, _)| call.name() == name)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Push a batch to every live subscriber of `kind`.
    pub async fn push(&self, kind: EventKind, batch: Vec<LogEntry>) {
        let senders: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, tx)| tx.clone())
            .collect();
        for tx in senders {
            let _ = tx.send(batch.clone()).await;
        }
    }

    /// Drop every subscription sender, ending the live feeds.
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().clear();
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn current_block_height(&self) -> Result<u64, CoreError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.head_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if *self.fail_head.lock() {
            return Err(CoreError::Network("connection refused".into()));
        }
        Ok(*self.height.lock())
    }

    async fn query_logs(
        &self,
        address: &Address,
        kind: EventKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, CoreError> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_logs.lock() {
            return Err(CoreError::Rpc {
                method: "eth_getLogs".into(),
                message: "query returned more than 10000 results".into(),
            });
        }
        Ok(self
            .logs
            .lock()
            .iter()
            .filter(|l| &l.address == address && l.kind == kind)
            .filter(|l| l.block_height.is_some_and(|h| h >= from && h <= to))
            .cloned()
            .collect())
    }

    async fn get_block(&self, height: u64) -> Result<BlockHeader, CoreError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.block_times
            .lock()
            .get(&height)
            .map(|ts| BlockHeader {
                height,
                timestamp: *ts,
            })
            .ok_or(CoreError::BlockNotFound(height))
    }

    async fn read_call(
        &self,
        address: &Address,
        call: &ViewCall,
        at_block: Option<u64>,
    ) -> Result<CallValue, CoreError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.read_log.lock().push((call.clone(), at_block));
        let responder = self.responder.lock();
        (*responder)(address, call, at_block)
    }

    async fn subscribe(
        &self,
        _address: &Address,
        kind: EventKind,
        from_block: u64,
    ) -> Result<LogSubscription, CoreError> {
        self.subscribed_from.lock().push((kind, from_block));
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().push((kind, tx));
        Ok(LogSubscription::new(rx))
    }

    async fn submit_transaction(&self, address: &Address, call: &WriteCall) -> Result<TxHash, CoreError> {
        if let Some(message) = self.submit_error.lock().clone() {
            return Err(CoreError::Rpc {
                method: "eth_sendTransaction".into(),
                message,
            });
        }
        let mut submitted = self.submitted.lock();
        submitted.push((address.clone(), call.clone()));
        Ok(TxHash(format!("0x{:064x}", submitted.len())))
    }

    async fn await_confirmation(&self, tx: &TxHash) -> Result<TxReceipt, CoreError> {
        Ok(TxReceipt {
            transaction_id: tx.clone(),
            block_height: *self.height.lock(),
            status: *self.receipt_status.lock(),
        })
    }
}
