// ═══════════════════════════════════════════════════════════════════
// Read-Model Tests — unconfigured state, formatting, dependent reads,
// partial failures
// ═══════════════════════════════════════════════════════════════════

mod common;

use primitive_types::U256;
use std::sync::Arc;

use common::*;
use vault_lens_core::errors::CoreError;
use vault_lens_core::models::chain::{Address, CallValue, ViewCall};
use vault_lens_core::models::read_model::VaultSnapshot;
use vault_lens_core::services::read_model_service::ReadModelAdapter;

fn usdc() -> Address {
    addr(0xee)
}

fn vault_state(_: &Address, call: &ViewCall, _: Option<u64>) -> Result<CallValue, CoreError> {
    let value = match call {
        ViewCall::Asset => return Ok(CallValue::Address(usdc())),
        ViewCall::Symbol => return Ok(CallValue::Text("USDC".into())),
        ViewCall::Decimals => U256::from(6u8),
        ViewCall::TotalAssets => U256::from(1_234_500_000u64),
        ViewCall::TotalSupply => tokens(1000),
        ViewCall::ConvertToAssets(_) => U256::from(1_050_000u64),
        ViewCall::BalanceOf(_) => tokens(25),
        ViewCall::PreviewDeposit(_) => U256::from(952_380_952_380_952_380u64),
        ViewCall::PreviewRedeem(_) => U256::from(1_050_000u64),
        other => {
            return Err(CoreError::Rpc {
                method: "eth_call".into(),
                message: format!("{} not mocked", other.name()),
            })
        }
    };
    Ok(CallValue::Uint(value))
}

fn vault_client() -> Arc<MockChainClient> {
    Arc::new(MockChainClient::new(100).with_responder(vault_state))
}

// ═══════════════════════════════════════════════════════════════════
// Unconfigured
// ═══════════════════════════════════════════════════════════════════

mod unconfigured {
    use super::*;

    #[tokio::test]
    async fn every_numeric_field_is_zero_without_reads() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());

        let snapshot = adapter.refresh(None, Some(&addr(1))).await;

        assert!(!snapshot.is_configured);
        assert!(!snapshot.is_loading);
        for value in [
            &snapshot.total_assets,
            &snapshot.total_supply,
            &snapshot.price_per_share,
            &snapshot.user_shares,
            &snapshot.preview_deposit,
            &snapshot.preview_redeem,
        ] {
            assert_eq!(value, "0");
        }
        assert!(snapshot.asset_symbol.is_empty());
        assert_eq!(client.total_calls(), 0);
    }

    #[test]
    fn initial_snapshot_is_unconfigured() {
        let adapter = ReadModelAdapter::new(vault_client());
        assert_eq!(adapter.snapshot(), VaultSnapshot::unconfigured());
        assert_eq!(VaultSnapshot::default(), VaultSnapshot::unconfigured());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Configured
// ═══════════════════════════════════════════════════════════════════

mod configured {
    use super::*;

    #[tokio::test]
    async fn values_are_formatted_with_their_own_precision() {
        let adapter = ReadModelAdapter::new(vault_client());

        let snapshot = adapter.refresh(Some(&vault_a()), Some(&addr(1))).await;

        assert!(snapshot.is_configured);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.vault_address, Some(vault_a()));
        assert_eq!(snapshot.asset_address, Some(usdc()));
        assert_eq!(snapshot.decimals, 6);
        assert_eq!(snapshot.asset_symbol, "USDC");
        assert_eq!(snapshot.total_assets, "1234.5");
        assert_eq!(snapshot.total_supply, "1000");
        assert_eq!(snapshot.price_per_share, "1.05");
        assert_eq!(snapshot.user_shares, "25");
        assert_eq!(snapshot.preview_deposit, "0.95238095238095238");
        assert_eq!(snapshot.preview_redeem, "1.05");
        assert_eq!(adapter.decimals(), 6);
        assert_eq!(snapshot.position_value(), 26.25);
    }

    #[tokio::test]
    async fn previews_use_one_whole_unit() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());

        adapter.refresh(Some(&vault_a()), None).await;

        let log = client.read_log.lock();
        assert!(log.iter().any(|(c, _)| *c == ViewCall::PreviewDeposit(U256::from(1_000_000u64))));
        assert!(log.iter().any(|(c, _)| *c == ViewCall::PreviewRedeem(U256::exp10(18))));
        assert!(log.iter().any(|(c, _)| *c == ViewCall::ConvertToAssets(U256::exp10(18))));
    }

    #[tokio::test]
    async fn no_account_means_zero_shares_without_balance_read() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());

        let snapshot = adapter.refresh(Some(&vault_a()), None).await;

        assert_eq!(snapshot.user_shares, "0");
        assert!(client.reads_of("balanceOf").is_empty());
    }

    #[tokio::test]
    async fn unresolved_asset_never_leaves_loading_stuck() {
        let client = Arc::new(MockChainClient::new(100).with_responder(|vault, call, at| match call {
            ViewCall::Asset => Err(CoreError::Rpc {
                method: "eth_call".into(),
                message: "execution reverted".into(),
            }),
            _ => vault_state(vault, call, at),
        }));
        let adapter = ReadModelAdapter::new(client.clone());

        let snapshot = adapter.refresh(Some(&vault_a()), None).await;

        assert!(snapshot.is_configured);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.asset_address, None);
        assert!(snapshot.asset_symbol.is_empty());
        assert_eq!(snapshot.decimals, 18);
        assert!(client.reads_of("decimals").is_empty());
        assert!(client.reads_of("symbol").is_empty());
    }

    #[tokio::test]
    async fn failed_read_keeps_the_previous_value() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());
        adapter.refresh(Some(&vault_a()), None).await;

        client.set_responder(|vault, call, at| match call {
            ViewCall::TotalAssets => Err(CoreError::Network("timeout".into())),
            _ => vault_state(vault, call, at),
        });
        let snapshot = adapter.refresh(Some(&vault_a()), None).await;

        assert_eq!(snapshot.total_assets, "1234.5");
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn failed_asset_read_keeps_the_known_asset_and_precision() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());
        adapter.refresh(Some(&vault_a()), None).await;

        client.set_responder(|vault, call, at| match call {
            ViewCall::Asset => Err(CoreError::Network("timeout".into())),
            _ => vault_state(vault, call, at),
        });
        let snapshot = adapter.refresh(Some(&vault_a()), None).await;

        assert_eq!(snapshot.asset_address, Some(usdc()));
        assert_eq!(snapshot.decimals, 6);
        assert_eq!(snapshot.asset_symbol, "USDC");
        assert_eq!(snapshot.total_assets, "1234.5");
        assert_eq!(snapshot.price_per_share, "1.05");
        assert_eq!(snapshot.preview_redeem, "1.05");
        // Precision is re-read against the known asset.
        assert_eq!(client.reads_of("decimals").len(), 2);
    }

    #[tokio::test]
    async fn failed_asset_and_decimals_reads_keep_the_last_precision() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());
        adapter.refresh(Some(&vault_a()), None).await;

        client.set_responder(|vault, call, at| match call {
            ViewCall::Asset | ViewCall::Decimals | ViewCall::Symbol => {
                Err(CoreError::Network("timeout".into()))
            }
            _ => vault_state(vault, call, at),
        });
        let snapshot = adapter.refresh(Some(&vault_a()), None).await;

        assert_eq!(snapshot.decimals, 6);
        assert_eq!(snapshot.asset_symbol, "USDC");
        assert_eq!(snapshot.total_assets, "1234.5");
        assert_eq!(adapter.decimals(), 6);
    }

    #[tokio::test]
    async fn previous_values_do_not_leak_across_vaults() {
        let client = vault_client();
        let adapter = ReadModelAdapter::new(client.clone());
        adapter.refresh(Some(&vault_a()), None).await;

        client.set_responder(|_, _, _| Err(CoreError::Network("down".into())));
        let snapshot = adapter.refresh(Some(&vault_b()), None).await;

        assert_eq!(snapshot.vault_address, Some(vault_b()));
        assert_eq!(snapshot.total_assets, "0");
        assert_eq!(snapshot.price_per_share, "0");
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn clearing_the_vault_returns_to_unconfigured() {
        let adapter = ReadModelAdapter::new(vault_client());
        adapter.refresh(Some(&vault_a()), None).await;

        let snapshot = adapter.refresh(None, None).await;
        assert_eq!(snapshot, VaultSnapshot::unconfigured());
    }
}
