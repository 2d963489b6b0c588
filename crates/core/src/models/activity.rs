use serde::{Deserialize, Serialize};

use super::event::EventKind;

/// One row of the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub kind: EventKind,
    /// Shortened owner address
    pub owner: String,
    /// Formatted asset amount followed by the symbol
    pub amount: String,
    /// Relative time, e.g. "5m ago"; "—" when the block time is unknown
    pub time_ago: String,
    pub transaction_id: String,
    pub log_position: u64,
    /// Block explorer link, only for real events
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityFeed {
    pub items: Vec<ActivityItem>,
    /// True when `items` are placeholder samples rather than on-chain events
    pub is_sample: bool,
    pub loading: bool,
}
