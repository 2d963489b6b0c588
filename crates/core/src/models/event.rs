use primitive_types::U256;
use serde::{Deserialize, Serialize};

use super::chain::{Address, LogEntry, TxHash};

/// Direction of a vault event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `Deposit(caller, owner, assets, shares)`
    Inflow,
    /// `Withdraw(caller, receiver, owner, assets, shares)`
    Outflow,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Inflow, EventKind::Outflow];

    /// Name of the on-chain event.
    pub fn event_name(&self) -> &'static str {
        match self {
            EventKind::Inflow => "Deposit",
            EventKind::Outflow => "Withdraw",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

/// Dedup and ordering key: `(block_height, log_position)`.
///
/// Derived `Ord` compares block height first, then log position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub block_height: u64,
    pub log_position: u64,
}

/// A single Deposit/Withdraw observed on the vault.
///
/// Created only by the event store's ingestion routines and never mutated after
/// insertion into the working set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultEvent {
    pub kind: EventKind,

    /// Underlying asset amount, in the asset's smallest unit
    pub asset_amount: U256,

    /// Vault share amount, in the share token's smallest unit
    pub share_amount: U256,

    pub initiator: Address,
    pub owner: Address,

    /// Withdraw receiver
    #[serde(default)]
    pub beneficiary: Option<Address>,

    pub transaction_id: TxHash,
    pub block_height: u64,
    pub log_position: u64,

    /// Unix timestamp of the containing block, `0` when unresolved
    pub observed_at: i64,
}

impl VaultEvent {
    /// Build an event from a confirmed log. Pending logs (no block height or
    /// log position yet) have no stable key and yield `None`.
    pub fn from_log(log: LogEntry, observed_at: i64) -> Option<Self> {
        Some(Self {
            kind: log.kind,
            asset_amount: log.asset_amount,
            share_amount: log.share_amount,
            initiator: log.initiator,
            owner: log.owner,
            beneficiary: log.beneficiary,
            transaction_id: log.transaction_id,
            block_height: log.block_height?,
            log_position: log.log_position?,
            observed_at,
        })
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            block_height: self.block_height,
            log_position: self.log_position,
        }
    }

    pub fn has_timestamp(&self) -> bool {
        self.observed_at > 0
    }
}

/// Snapshot of the event store handed to presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFeed {
    /// Most recent first
    pub events: Vec<VaultEvent>,
    pub loading: bool,
}
