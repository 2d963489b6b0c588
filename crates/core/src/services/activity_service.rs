use primitive_types::U256;

use crate::models::activity::{ActivityFeed, ActivityItem};
use crate::models::chain::Address;
use crate::models::chart::SeriesPoint;
use crate::models::event::{EventFeed, EventKind};
use crate::models::settings::EngineConfig;
use crate::units;

/// Rows shown in the activity feed.
pub const FEED_LENGTH: usize = 8;

/// Rows generated when there is no real activity yet.
const SAMPLE_LENGTH: usize = 3;

const SAMPLE_OWNERS: [&str; SAMPLE_LENGTH] = [
    "0x5e2c3b3f4d7a8b9c0d1e2f3a4b5c6d7e8f9a0b1c",
    "0x7a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b",
    "0x9b8a7c6d5e4f3a2b1c0d9e8f7a6b5c4d3e2f1a0b",
];

/// Placeholder for an unresolved block time.
pub const UNKNOWN_TIME: &str = "—";

/// Relative age of `observed_at` as seen at `now`.
pub fn time_ago(observed_at: i64, now: i64) -> String {
    if observed_at <= 0 {
        return UNKNOWN_TIME.to_string();
    }
    let seconds = (now - observed_at).max(0);
    if seconds < 60 {
        return format!("{seconds}s ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Display rows for the most recent events.
///
/// Falls back to [`sample_activity`] (seeded by the current hour) while the
/// working set is empty, so the feed never renders blank.
pub fn build_activity_feed(
    feed: &EventFeed,
    decimals: u8,
    symbol: &str,
    config: &EngineConfig,
    now: i64,
) -> ActivityFeed {
    let symbol = if symbol.is_empty() { "ASSET" } else { symbol };

    if feed.events.is_empty() {
        let mut sample = sample_activity(now / 3600, now, decimals, symbol);
        sample.loading = feed.loading;
        return sample;
    }

    let items = feed
        .events
        .iter()
        .take(FEED_LENGTH)
        .map(|event| ActivityItem {
            kind: event.kind,
            owner: event.owner.shorten(),
            amount: format!("{} {symbol}", units::format_units(event.asset_amount, decimals)),
            time_ago: time_ago(event.observed_at, now),
            transaction_id: event.transaction_id.to_string(),
            log_position: event.log_position,
            explorer_url: config.explorer_tx_url(&event.transaction_id.0),
        })
        .collect();

    ActivityFeed {
        items,
        is_sample: false,
        loading: feed.loading,
    }
}

/// Park–Miller minimal standard generator, yielding values in `[0, 1)`.
struct SampleRng {
    value: i64,
}

impl SampleRng {
    const MODULUS: i64 = 2_147_483_647;

    fn new(seed: i64) -> Self {
        let mut value = seed % Self::MODULUS;
        if value <= 0 {
            value += Self::MODULUS - 1;
        }
        Self { value }
    }

    fn next(&mut self) -> f64 {
        self.value = self.value * 16_807 % Self::MODULUS;
        (self.value - 1) as f64 / (Self::MODULUS - 1) as f64
    }
}

/// Deterministic placeholder activity for `seed`. Amounts are whole asset units.
pub fn sample_activity(seed: i64, now: i64, decimals: u8, symbol: &str) -> ActivityFeed {
    let mut rng = SampleRng::new(seed);

    let items = (0..SAMPLE_LENGTH)
        .map(|index| {
            let kind = if rng.next() > 0.35 {
                EventKind::Inflow
            } else {
                EventKind::Outflow
            };
            let whole = 200 + (rng.next() * 1200.0).round() as u64;
            let assets = units::one_unit(decimals)
                .and_then(|unit| unit.checked_mul(U256::from(whole)))
                .unwrap_or_else(|| U256::from(whole));
            let age = (index as i64 + 1) * (1800 + (rng.next() * 2400.0).round() as i64);
            let owner = SAMPLE_OWNERS[index]
                .parse::<Address>()
                .map(|a| a.shorten())
                .unwrap_or_else(|_| SAMPLE_OWNERS[index].to_string());

            ActivityItem {
                kind,
                owner,
                amount: format!("{} {symbol}", units::format_units(assets, decimals)),
                time_ago: time_ago(now - age, now),
                transaction_id: format!("0x{:064x}", seed.wrapping_add(index as i64)),
                log_position: index as u64,
                explorer_url: None,
            }
        })
        .collect();

    ActivityFeed {
        items,
        is_sample: true,
        loading: false,
    }
}

/// Placeholder price-per-share and net-flow series, labeled `D-13` to `D-0`.
pub fn sample_series() -> (Vec<SeriesPoint>, Vec<SeriesPoint>) {
    const POINTS: usize = 14;
    let mut current = 1.02_f64;
    let mut price = Vec::with_capacity(POINTS);
    let mut flow = Vec::with_capacity(POINTS);

    for i in 0..POINTS {
        let x = i as f64;
        let label = format!("D-{}", POINTS - 1 - i);
        current += (x / 2.0).sin() * 0.01 + 0.003;
        price.push(SeriesPoint::new(label.clone(), (current * 10_000.0).round() / 10_000.0));
        flow.push(SeriesPoint::new(label, ((x.sin() + 1.2) * 120.0).round() - 60.0));
    }
    (price, flow)
}
