use std::collections::BTreeMap;

/// Small bounded cache of block timestamps keyed by block height.
///
/// Only a dedup guard for repeated lookups of the same block, not a general
/// purpose cache: insert-or-reuse, and when full the lowest block heights are
/// dropped first (older blocks are the least likely to be asked for again).
#[derive(Debug, Clone)]
pub struct BlockTimeCache {
    entries: BTreeMap<u64, i64>,
    capacity: usize,
}

impl BlockTimeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, block_height: u64) -> Option<i64> {
        self.entries.get(&block_height).copied()
    }

    /// Insert a resolved timestamp. An existing entry is kept as is.
    pub fn insert(&mut self, block_height: u64, timestamp: i64) -> i64 {
        let ts = *self.entries.entry(block_height).or_insert(timestamp);
        while self.entries.len() > self.capacity {
            if self.entries.pop_first().is_none() {
                break;
            }
        }
        ts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for BlockTimeCache {
    fn default() -> Self {
        Self::new(256)
    }
}
