// ═══════════════════════════════════════════════════════════════════
// Activity Tests — feed rows, relative times, sample data
// ═══════════════════════════════════════════════════════════════════

mod common;

use common::*;
use vault_lens_core::models::event::{EventFeed, EventKind};
use vault_lens_core::models::settings::EngineConfig;
use vault_lens_core::services::activity_service::{
    build_activity_feed, sample_activity, sample_series, time_ago, FEED_LENGTH, UNKNOWN_TIME,
};

const NOW: i64 = MAR_4_NOON + 3 * DAY;

fn feed(count: u64) -> EventFeed {
    EventFeed {
        events: (0..count)
            .rev()
            .map(|b| event(EventKind::Inflow, b + 1, 0, tokens(b + 1), NOW - 120))
            .collect(),
        loading: false,
    }
}

// ── time_ago ────────────────────────────────────────────────────────

mod relative_time {
    use super::*;

    #[test]
    fn unresolved_time_is_a_dash() {
        assert_eq!(time_ago(0, NOW), UNKNOWN_TIME);
    }

    #[test]
    fn each_unit_is_floored() {
        assert_eq!(time_ago(NOW - 30, NOW), "30s ago");
        assert_eq!(time_ago(NOW - 119, NOW), "1m ago");
        assert_eq!(time_ago(NOW - 7_200, NOW), "2h ago");
        assert_eq!(time_ago(NOW - 3 * DAY - 5, NOW), "3d ago");
    }

    #[test]
    fn clock_skew_reads_as_now() {
        assert_eq!(time_ago(NOW + 10, NOW), "0s ago");
    }
}

// ── build_activity_feed ─────────────────────────────────────────────

mod activity_feed {
    use super::*;

    #[test]
    fn shows_the_most_recent_events_only() {
        let activity = build_activity_feed(&feed(12), 18, "USDC", &EngineConfig::default(), NOW);

        assert!(!activity.is_sample);
        assert_eq!(activity.items.len(), FEED_LENGTH);
        assert_eq!(activity.items[0].amount, "12 USDC");
        assert_eq!(activity.items[0].owner, addr(2).shorten());
        assert_eq!(activity.items[0].time_ago, "2m ago");
        assert_eq!(activity.items[7].amount, "5 USDC");
    }

    #[test]
    fn rows_link_to_the_explorer() {
        let activity = build_activity_feed(&feed(1), 18, "USDC", &EngineConfig::default(), NOW);
        let item = &activity.items[0];
        assert_eq!(
            item.explorer_url.as_deref(),
            Some(format!("https://sepolia.etherscan.io/tx/{}", item.transaction_id).as_str())
        );
    }

    #[test]
    fn missing_symbol_falls_back_to_asset() {
        let activity = build_activity_feed(&feed(1), 18, "", &EngineConfig::default(), NOW);
        assert_eq!(activity.items[0].amount, "1 ASSET");
    }

    #[test]
    fn empty_feed_shows_sample_rows() {
        let empty = EventFeed {
            events: vec![],
            loading: true,
        };
        let activity = build_activity_feed(&empty, 6, "USDC", &EngineConfig::default(), NOW);

        assert!(activity.is_sample);
        assert!(activity.loading);
        assert_eq!(activity.items.len(), 3);
        assert!(activity.items.iter().all(|i| i.explorer_url.is_none()));
        assert!(activity.items.iter().all(|i| i.amount.ends_with(" USDC")));
    }
}

// ── Sample data ─────────────────────────────────────────────────────

mod samples {
    use super::*;

    #[test]
    fn same_seed_same_rows() {
        assert_eq!(
            sample_activity(480_000, NOW, 6, "USDC"),
            sample_activity(480_000, NOW, 6, "USDC")
        );
        assert_ne!(
            sample_activity(480_000, NOW, 6, "USDC").items,
            sample_activity(480_001, NOW, 6, "USDC").items
        );
    }

    #[test]
    fn rows_follow_the_seeded_sequence() {
        let activity = sample_activity(1, NOW, 6, "USDC");
        let rows: Vec<_> = activity
            .items
            .iter()
            .map(|i| (i.kind, i.amount.as_str(), i.time_ago.as_str()))
            .collect();

        assert_eq!(
            rows,
            vec![
                (EventKind::Outflow, "358 USDC", "1h ago"),
                (EventKind::Inflow, "839 USDC", "1h ago"),
                (EventKind::Outflow, "1015 USDC", "2h ago"),
            ]
        );
        assert_eq!(activity.items[0].transaction_id, format!("0x{}1", "0".repeat(63)));
        assert_eq!(activity.items[2].log_position, 2);
    }

    #[test]
    fn sample_series_has_fourteen_labeled_days() {
        let (price, flow) = sample_series();

        assert_eq!(price.len(), 14);
        assert_eq!(flow.len(), 14);
        assert_eq!(price[0].label, "D-13");
        assert_eq!(price[13].label, "D-0");
        assert_eq!(price[0].value, 1.023);
        assert_eq!(flow[0].value, 84.0);
        assert_eq!(flow[4].value, -7.0);
    }
}
