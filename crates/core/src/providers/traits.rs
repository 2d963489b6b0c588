use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::errors::CoreError;
use crate::models::chain::{
    Address, BlockHeader, CallValue, LogEntry, TxHash, TxReceipt, ViewCall, WriteCall,
};
use crate::models::event::EventKind;

/// A live feed of confirmed logs for one contract and one event kind.
///
/// Each message is an immutable batch. Dropping the subscription tells the
/// producer to stop.
#[derive(Debug)]
pub struct LogSubscription {
    receiver: mpsc::Receiver<Vec<LogEntry>>,
}

impl LogSubscription {
    pub fn new(receiver: mpsc::Receiver<Vec<LogEntry>>) -> Self {
        Self { receiver }
    }

    /// Next batch, or `None` once the producer has gone away.
    pub async fn next_batch(&mut self) -> Option<Vec<LogEntry>> {
        self.receiver.recv().await
    }
}

/// Everything the engine needs from the chain.
///
/// Injected into every component as `Arc<dyn ChainClient>` so that tests can
/// swap in a deterministic mock. Implementations are expected to be slow,
/// rate limited and occasionally failing; the engine never retries on its own.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Human-readable name of this client (for logs/errors).
    fn name(&self) -> &str;

    async fn current_block_height(&self) -> Result<u64, CoreError>;

    /// All logs of `kind` emitted by `address` in `from..=to`.
    async fn query_logs(
        &self,
        address: &Address,
        kind: EventKind,
        from: u64,
        to: u64,
    ) -> Result<Vec<LogEntry>, CoreError>;

    async fn get_block(&self, height: u64) -> Result<BlockHeader, CoreError>;

    /// Execute a view call, optionally against historical state at `at_block`.
    async fn read_call(
        &self,
        address: &Address,
        call: &ViewCall,
        at_block: Option<u64>,
    ) -> Result<CallValue, CoreError>;

    /// Push-based feed of confirmed logs from `from_block` onward. No ordering
    /// guarantee across batches, and the same log may be delivered more than once.
    async fn subscribe(&self, address: &Address, kind: EventKind, from_block: u64)
        -> Result<LogSubscription, CoreError>;

    async fn submit_transaction(&self, address: &Address, call: &WriteCall)
        -> Result<TxHash, CoreError>;

    /// Wait until the transaction is mined. A reverted transaction is still an
    /// `Ok` receipt; callers inspect `status`.
    async fn await_confirmation(&self, tx: &TxHash) -> Result<TxReceipt, CoreError>;
}
