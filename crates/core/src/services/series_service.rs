use chrono::{DateTime, NaiveDate};
use futures::future::join_all;
use parking_lot::Mutex;
use primitive_types::U256;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::chain::{Address, ViewCall};
use crate::models::chart::{SeriesPoint, VaultSeries};
use crate::models::event::{EventKind, VaultEvent};
use crate::models::read_model::SHARE_DECIMALS;
use crate::models::settings::EngineConfig;
use crate::providers::traits::ChainClient;
use crate::units;

/// Label used for events whose block time could not be resolved.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Calendar day (UTC) of a block timestamp; `None` when unresolved.
pub fn day_of(observed_at: i64) -> Option<NaiveDate> {
    if observed_at <= 0 {
        return None;
    }
    DateTime::from_timestamp(observed_at, 0).map(|dt| dt.date_naive())
}

/// Short calendar label, e.g. "Mar 4".
pub fn day_label(day: NaiveDate) -> String {
    day.format("%b %-d").to_string()
}

pub fn time_label(observed_at: i64) -> String {
    day_of(observed_at).map_or_else(|| UNKNOWN_LABEL.to_string(), day_label)
}

/// The `limit` most recent events, oldest first.
pub fn recent_events_ascending(events: &[VaultEvent], limit: usize) -> Vec<&VaultEvent> {
    let mut ordered: Vec<&VaultEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.key());
    let skip = ordered.len().saturating_sub(limit);
    ordered.split_off(skip)
}

/// Net asset flow per calendar day over the whole list.
///
/// Buckets are keyed by the day itself (not its label) so the output is
/// chronological even across a year boundary. Amounts are summed as integers
/// and scaled once per bucket. Unresolved events land in a trailing
/// [`UNKNOWN_LABEL`] bucket so the total still matches the list.
pub fn build_flow_series(events: &[VaultEvent], decimals: u8) -> Vec<SeriesPoint> {
    #[derive(Default)]
    struct Bucket {
        inflow: U256,
        outflow: U256,
    }

    impl Bucket {
        fn add(&mut self, event: &VaultEvent) {
            match event.kind {
                EventKind::Inflow => self.inflow = self.inflow.saturating_add(event.asset_amount),
                EventKind::Outflow => self.outflow = self.outflow.saturating_add(event.asset_amount),
            }
        }

        fn net(&self, decimals: u8) -> f64 {
            units::to_f64(self.inflow, decimals) - units::to_f64(self.outflow, decimals)
        }
    }

    let mut days: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
    let mut unknown: Option<Bucket> = None;

    for event in events {
        match day_of(event.observed_at) {
            Some(day) => days.entry(day).or_default().add(event),
            None => unknown.get_or_insert_with(Bucket::default).add(event),
        }
    }

    let mut series: Vec<SeriesPoint> = days
        .iter()
        .map(|(day, bucket)| SeriesPoint::new(day_label(*day), bucket.net(decimals)))
        .collect();
    if let Some(bucket) = unknown {
        series.push(SeriesPoint::new(UNKNOWN_LABEL, bucket.net(decimals)));
    }
    series
}

/// Inputs that invalidate the series when any of them changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint {
    target: Option<Address>,
    decimals: u8,
    revision: u64,
}

struct SeriesState {
    price_series: Vec<SeriesPoint>,
    flow_series: Vec<SeriesPoint>,
    building: bool,
    generation: u64,
    fingerprint: Option<Fingerprint>,
}

/// Derives the price-per-share and net-flow series from the event list.
///
/// Series are always rebuilt from scratch: a new event, new decimals or a new
/// target each trigger a full rebuild, never an incremental patch.
pub struct SeriesBuilder {
    client: Mutex<Arc<dyn ChainClient>>,
    price_points: usize,
    state: Mutex<SeriesState>,
}

impl SeriesBuilder {
    pub fn new(client: Arc<dyn ChainClient>, config: &EngineConfig) -> Self {
        Self {
            client: Mutex::new(client),
            price_points: config.price_points,
            state: Mutex::new(SeriesState {
                price_series: Vec::new(),
                flow_series: Vec::new(),
                // Not evaluated yet.
                building: true,
                generation: 0,
                fingerprint: None,
            }),
        }
    }

    pub fn set_client(&self, client: Arc<dyn ChainClient>) {
        *self.client.lock() = client;
        let mut state = self.state.lock();
        state.fingerprint = None;
        state.generation += 1;
    }

    /// Current series with the composite loading flag.
    pub fn series(&self, events_loading: bool) -> VaultSeries {
        let state = self.state.lock();
        VaultSeries {
            price_series: state.price_series.clone(),
            flow_series: state.flow_series.clone(),
            loading: events_loading || state.building,
        }
    }

    /// Rebuild both series if `target`, `decimals` or the event list
    /// (`revision`) changed since the last build. Returns whether a build
    /// was committed.
    pub async fn refresh(
        &self,
        target: Option<&Address>,
        decimals: u8,
        revision: u64,
        events: &[VaultEvent],
    ) -> bool {
        let fingerprint = Fingerprint {
            target: target.cloned(),
            decimals,
            revision,
        };

        let (generation, client) = {
            let mut state = self.state.lock();
            if state.fingerprint.as_ref() == Some(&fingerprint) {
                return false;
            }
            state.fingerprint = Some(fingerprint);
            state.generation += 1;

            let Some(target) = target.filter(|_| !events.is_empty()) else {
                state.price_series.clear();
                state.flow_series.clear();
                state.building = false;
                return true;
            };
            state.building = true;
            debug!(%target, events = events.len(), "rebuilding series");
            (state.generation, self.client.lock().clone())
        };

        let flow_series = build_flow_series(events, decimals);
        let price_series = match target {
            Some(target) => self.build_price_series(client.as_ref(), target, events, decimals).await,
            None => Vec::new(),
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!("discarding superseded series build");
            return false;
        }
        state.price_series = price_series;
        state.flow_series = flow_series;
        state.building = false;
        true
    }

    /// One historical `convertToAssets(1 share)` read per recent event, at
    /// that event's block. Failed lookups are left out of the chart.
    async fn build_price_series(
        &self,
        client: &dyn ChainClient,
        vault: &Address,
        events: &[VaultEvent],
        decimals: u8,
    ) -> Vec<SeriesPoint> {
        let one_share = U256::exp10(SHARE_DECIMALS as usize);
        let call = ViewCall::ConvertToAssets(one_share);
        let recent = recent_events_ascending(events, self.price_points);

        let lookups = join_all(
            recent
                .iter()
                .map(|event| client.read_call(vault, &call, Some(event.block_height))),
        )
        .await;

        recent
            .into_iter()
            .zip(lookups)
            .filter_map(|(event, result)| match result.and_then(|v| v.into_uint()) {
                Ok(price) => Some(SeriesPoint::new(
                    time_label(event.observed_at),
                    units::to_f64(price, decimals),
                )),
                Err(e) => {
                    warn!(block = event.block_height, error = %e, "price lookup failed");
                    None
                }
            })
            .collect()
    }
}
