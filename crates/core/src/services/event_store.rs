use futures::future::{join_all, try_join};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::block_time::BlockTimeCache;
use crate::models::chain::{Address, LogEntry};
use crate::models::event::{EventFeed, EventKind, VaultEvent};
use crate::models::settings::EngineConfig;
use crate::providers::traits::ChainClient;

/// Result of merging candidates into a working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// New working set, strictly descending by key, at most `capacity` long
    pub events: Vec<VaultEvent>,
    /// Candidates that were not already present
    pub inserted: usize,
    /// Candidates rejected because their key was already present
    pub duplicates: usize,
}

/// Pure reducer behind both ingestion paths: `(current, incoming) -> next`.
///
/// `current` must already be a valid working set. Candidates whose
/// `(block_height, log_position)` is already present (in `current` or earlier
/// in `incoming`) are dropped; the result is sorted descending and truncated,
/// so eviction always removes the lowest keys.
pub fn merge_events(current: &[VaultEvent], incoming: Vec<VaultEvent>, capacity: usize) -> MergeOutcome {
    let mut seen: HashSet<_> = current.iter().map(VaultEvent::key).collect();
    let mut events = current.to_vec();
    let mut inserted = 0;
    let mut duplicates = 0;

    for candidate in incoming {
        if seen.insert(candidate.key()) {
            events.push(candidate);
            inserted += 1;
        } else {
            duplicates += 1;
        }
    }

    events.sort_by(|a, b| b.key().cmp(&a.key()));
    events.truncate(capacity);

    MergeOutcome {
        events,
        inserted,
        duplicates,
    }
}

/// Live-path form of [`merge_events`] when only the next working set matters.
pub fn merge_live(current: &[VaultEvent], batch: Vec<VaultEvent>, capacity: usize) -> Vec<VaultEvent> {
    merge_events(current, batch, capacity).events
}

/// What happened to a `load_recent` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No target configured; working set is empty and nothing was fetched
    Unconfigured,
    /// The historical window was committed
    Committed { events: usize },
    /// The target or client changed while fetching; the result was dropped
    Stale,
}

/// What happened to a live batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    /// Logs for another contract, pending logs, or a batch that arrived after
    /// the target changed
    pub ignored: usize,
}

struct StoreState {
    client: Arc<dyn ChainClient>,
    target: Option<Address>,
    events: Vec<VaultEvent>,
    loading: bool,
    /// Bumped whenever the target or the client changes
    epoch: u64,
    /// Bumped by every historical load and every epoch change; a load commits
    /// only if the generation it captured is still current
    generation: u64,
    /// Bumped on every change to `events`
    revision: u64,
    /// Head block of the last committed historical window
    synced_head: Option<u64>,
}

impl StoreState {
    fn reset_for(&mut self, target: Option<Address>) {
        self.target = target;
        self.events.clear();
        self.loading = false;
        self.epoch += 1;
        self.generation += 1;
        self.revision += 1;
        self.synced_head = None;
    }
}

/// Canonical, capped, deduplicated list of vault events for one contract.
///
/// Merges a one-shot historical window with live pushes. Mutable state sits
/// behind a mutex that is never held across an `.await`, so every commit is
/// a single swap of the working set.
pub struct EventStore {
    history_depth: u64,
    capacity: usize,
    state: Mutex<StoreState>,
    block_times: Mutex<BlockTimeCache>,
}

impl EventStore {
    pub fn new(client: Arc<dyn ChainClient>, config: &EngineConfig) -> Self {
        Self {
            history_depth: config.history_depth.max(1),
            capacity: config.event_capacity.max(1),
            state: Mutex::new(StoreState {
                client,
                target: None,
                events: Vec::new(),
                loading: false,
                epoch: 0,
                generation: 0,
                revision: 0,
                synced_head: None,
            }),
            block_times: Mutex::new(BlockTimeCache::new(config.block_time_cache_size)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn target(&self) -> Option<Address> {
        self.state.lock().target.clone()
    }

    /// Current working set and loading flag.
    pub fn feed(&self) -> EventFeed {
        let state = self.state.lock();
        EventFeed {
            events: state.events.clone(),
            loading: state.loading,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Changes on every mutation of the working set.
    pub fn revision(&self) -> u64 {
        self.state.lock().revision
    }

    /// Point the store at another contract (or none). In-flight loads become
    /// stale and the working set starts over empty.
    pub fn set_target(&self, target: Option<Address>) {
        let mut state = self.state.lock();
        if state.target != target {
            debug!(from = ?state.target, to = ?target, "event store target changed");
            state.reset_for(target);
        }
    }

    /// Swap the chain client. In-flight loads become stale; the caller is
    /// expected to trigger a new `load_recent`.
    pub fn set_client(&self, client: Arc<dyn ChainClient>) {
        let mut state = self.state.lock();
        state.client = client;
        let target = state.target.clone();
        state.reset_for(target);
        drop(state);
        self.block_times.lock().clear();
    }

    /// Teardown: forget the target and make every in-flight load stale.
    pub fn shutdown(&self) {
        self.state.lock().reset_for(None);
    }

    /// Fetch the last `history_depth` blocks of Deposit/Withdraw logs for
    /// `address` and replace the working set with them.
    ///
    /// Live events already held above the fetched window survive the replace.
    /// On failure the working set is left untouched and loading is cleared.
    pub async fn load_recent(&self, address: Option<Address>) -> Result<LoadOutcome, CoreError> {
        let (client, target, generation) = {
            let mut state = self.state.lock();
            if state.target != address {
                state.reset_for(address.clone());
            }
            let Some(target) = state.target.clone() else {
                state.loading = false;
                return Ok(LoadOutcome::Unconfigured);
            };
            state.generation += 1;
            state.loading = true;
            (Arc::clone(&state.client), target, state.generation)
        };

        let fetched = self.fetch_window(client.as_ref(), &target).await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(%target, "discarding stale historical load");
            return Ok(LoadOutcome::Stale);
        }
        state.loading = false;

        let (latest, candidates) = match fetched {
            Ok(window) => window,
            Err(e) => {
                warn!(%target, error = %e, "historical load failed; keeping last known events");
                return Err(e);
            }
        };

        let retained: Vec<VaultEvent> = state
            .events
            .iter()
            .filter(|e| e.block_height > latest)
            .cloned()
            .collect();
        let outcome = merge_events(&retained, candidates, self.capacity);
        let count = outcome.events.len();
        state.events = outcome.events;
        state.revision += 1;
        state.synced_head = Some(latest);
        info!(%target, events = count, latest, "historical window committed");

        Ok(LoadOutcome::Committed { events: count })
    }

    /// Returns the latest block height and the timestamped candidates.
    async fn fetch_window(
        &self,
        client: &dyn ChainClient,
        target: &Address,
    ) -> Result<(u64, Vec<VaultEvent>), CoreError> {
        let latest = client.current_block_height().await?;
        let from = latest.saturating_sub(self.history_depth - 1);

        let (inflows, outflows) = try_join(
            client.query_logs(target, EventKind::Inflow, from, latest),
            client.query_logs(target, EventKind::Outflow, from, latest),
        )
        .await?;

        let logs: Vec<LogEntry> = inflows.into_iter().chain(outflows).collect();
        let heights: BTreeSet<u64> = logs.iter().filter_map(|l| l.block_height).collect();
        let times = self.resolve_block_times(client, heights).await;

        let candidates = logs
            .into_iter()
            .filter_map(|log| {
                let observed_at = log
                    .block_height
                    .and_then(|h| times.get(&h).copied())
                    .unwrap_or(0);
                VaultEvent::from_log(log, observed_at)
            })
            .collect();

        Ok((latest, candidates))
    }

    /// Batched, per-block deduplicated timestamp lookup. Blocks that fail to
    /// resolve are simply absent from the result.
    async fn resolve_block_times(
        &self,
        client: &dyn ChainClient,
        heights: BTreeSet<u64>,
    ) -> HashMap<u64, i64> {
        let mut resolved = HashMap::new();
        let mut missing = Vec::new();
        {
            let cache = self.block_times.lock();
            for height in heights {
                match cache.get(height) {
                    Some(ts) => {
                        resolved.insert(height, ts);
                    }
                    None => missing.push(height),
                }
            }
        }

        let fetched = join_all(missing.iter().map(|h| client.get_block(*h))).await;

        let mut cache = self.block_times.lock();
        for (height, result) in missing.into_iter().zip(fetched) {
            match result {
                Ok(block) => {
                    resolved.insert(height, cache.insert(height, block.timestamp));
                }
                Err(e) => warn!(height, error = %e, "block timestamp unresolved"),
            }
        }
        resolved
    }

    async fn block_time(&self, client: &dyn ChainClient, height: u64) -> i64 {
        let cached = self.block_times.lock().get(height);
        if let Some(ts) = cached {
            return ts;
        }
        match client.get_block(height).await {
            Ok(block) => self.block_times.lock().insert(height, block.timestamp),
            Err(e) => {
                warn!(height, error = %e, "block timestamp unresolved");
                0
            }
        }
    }

    /// Merge a batch of freshly observed logs into the working set.
    ///
    /// Each candidate's block time is resolved on its own. Keys already
    /// present are rejected silently, since the transport may redeliver.
    pub async fn ingest_live(&self, batch: Vec<LogEntry>) -> IngestOutcome {
        let (client, target, epoch) = {
            let state = self.state.lock();
            (Arc::clone(&state.client), state.target.clone(), state.epoch)
        };
        let total = batch.len();
        let Some(target) = target else {
            return IngestOutcome {
                ignored: total,
                ..IngestOutcome::default()
            };
        };

        let mut candidates = Vec::with_capacity(total);
        for log in batch.into_iter().filter(|l| l.address == target) {
            let Some(height) = log.block_height else {
                continue;
            };
            let observed_at = self.block_time(client.as_ref(), height).await;
            if let Some(event) = VaultEvent::from_log(log, observed_at) {
                candidates.push(event);
            }
        }
        let ignored = total - candidates.len();

        let mut state = self.state.lock();
        if state.epoch != epoch {
            debug!(%target, "discarding live batch for previous target");
            return IngestOutcome {
                ignored: total,
                ..IngestOutcome::default()
            };
        }

        let outcome = merge_events(&state.events, candidates, self.capacity);
        if outcome.inserted > 0 {
            state.events = outcome.events;
            state.revision += 1;
        }
        if outcome.duplicates > 0 {
            debug!(%target, duplicates = outcome.duplicates, "rejected redelivered logs");
        }

        IngestOutcome {
            inserted: outcome.inserted,
            duplicates: outcome.duplicates,
            ignored,
        }
    }

    /// Subscribe to both event kinds for the current target and feed every
    /// batch into [`EventStore::ingest_live`] until the returned handle is
    /// dropped. `None` when no target is configured.
    ///
    /// Both feeds start right after the last committed historical window, so
    /// blocks mined between the load and the subscription are not skipped.
    /// Without a committed window they start after the current head.
    pub async fn watch(self: &Arc<Self>) -> Result<Option<LiveWatch>, CoreError> {
        let (client, target, synced_head) = {
            let state = self.state.lock();
            (Arc::clone(&state.client), state.target.clone(), state.synced_head)
        };
        let Some(target) = target else {
            return Ok(None);
        };
        let from_block = match synced_head {
            Some(head) => head + 1,
            None => client.current_block_height().await? + 1,
        };
        debug!(%target, from_block, "starting live watch");

        let mut inflows = client.subscribe(&target, EventKind::Inflow, from_block).await?;
        let mut outflows = client.subscribe(&target, EventKind::Outflow, from_block).await?;
        let store = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut inflows_open = true;
            let mut outflows_open = true;
            while inflows_open || outflows_open {
                let batch = tokio::select! {
                    batch = inflows.next_batch(), if inflows_open => {
                        inflows_open = batch.is_some();
                        batch
                    }
                    batch = outflows.next_batch(), if outflows_open => {
                        outflows_open = batch.is_some();
                        batch
                    }
                };
                if let Some(batch) = batch {
                    let outcome = store.ingest_live(batch).await;
                    debug!(?outcome, "live batch ingested");
                }
            }
            debug!(%target, "live watch ended");
        });

        Ok(Some(LiveWatch { handle }))
    }
}

/// Handle to a running live subscription. Dropping it stops ingestion.
#[derive(Debug)]
pub struct LiveWatch {
    handle: JoinHandle<()>,
}

impl LiveWatch {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for LiveWatch {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
