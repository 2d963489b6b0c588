use parking_lot::Mutex;
use primitive_types::U256;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::chain::{Address, ViewCall};
use crate::models::read_model::{VaultSnapshot, FALLBACK_DECIMALS, SHARE_DECIMALS};
use crate::providers::traits::ChainClient;
use crate::units;

struct AdapterState {
    snapshot: VaultSnapshot,
    generation: u64,
}

/// Turns raw vault/asset scalars into a decimals-normalized [`VaultSnapshot`].
///
/// Dependent reads are chained: the asset address gates `decimals()` and
/// `symbol()`, and the asset precision gates the one-unit deposit preview.
/// A read that fails keeps the value from the last snapshot of the same vault
/// (or `"0"`), so the panel never goes blank on a transient error. That
/// includes `asset()`: a known asset address keeps driving the precision.
pub struct ReadModelAdapter {
    client: Mutex<Arc<dyn ChainClient>>,
    state: Mutex<AdapterState>,
}

impl ReadModelAdapter {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client: Mutex::new(client),
            state: Mutex::new(AdapterState {
                snapshot: VaultSnapshot::unconfigured(),
                generation: 0,
            }),
        }
    }

    pub fn set_client(&self, client: Arc<dyn ChainClient>) {
        *self.client.lock() = client;
        let mut state = self.state.lock();
        state.generation += 1;
        state.snapshot.is_loading = false;
    }

    pub fn snapshot(&self) -> VaultSnapshot {
        self.state.lock().snapshot.clone()
    }

    /// Asset precision of the current snapshot (18 until resolved).
    pub fn decimals(&self) -> u8 {
        self.state.lock().snapshot.decimals
    }

    /// Re-read every scalar for `vault` on behalf of `account`.
    ///
    /// With no vault this returns the unconfigured snapshot without touching
    /// the chain. A refresh superseded by a newer one is not committed.
    pub async fn refresh(&self, vault: Option<&Address>, account: Option<&Address>) -> VaultSnapshot {
        let Some(vault) = vault else {
            let mut state = self.state.lock();
            state.generation += 1;
            state.snapshot = VaultSnapshot::unconfigured();
            return state.snapshot.clone();
        };

        let (generation, client, previous) = {
            let mut state = self.state.lock();
            state.generation += 1;
            let previous = if state.snapshot.vault_address.as_ref() == Some(vault) {
                state.snapshot.clone()
            } else {
                VaultSnapshot::unconfigured()
            };
            state.snapshot = VaultSnapshot {
                is_configured: true,
                is_loading: true,
                vault_address: Some(vault.clone()),
                ..previous.clone()
            };
            (state.generation, self.client.lock().clone(), previous)
        };
        let client = client.as_ref();

        let asset_address = match client
            .read_call(vault, &ViewCall::Asset, None)
            .await
            .and_then(|v| v.into_address())
        {
            Ok(asset) => Some(asset),
            Err(e) => {
                warn!(%vault, error = %e, "asset address unavailable; keeping last known");
                previous.asset_address.clone()
            }
        };

        // Asset-dependent reads stay disabled rather than pending when the
        // asset address has never been resolved for this vault.
        let (decimals, asset_symbol) = match &asset_address {
            Some(asset) => {
                let (decimals, symbol) = futures::join!(
                    client.read_call(asset, &ViewCall::Decimals, None),
                    client.read_call(asset, &ViewCall::Symbol, None),
                );
                let decimals = decimals
                    .and_then(|v| v.into_uint())
                    .ok()
                    .filter(|d| *d <= U256::from(u8::MAX))
                    .map_or(previous.decimals, |d| d.low_u64() as u8);
                let symbol = symbol
                    .and_then(|v| v.into_text())
                    .unwrap_or_else(|_| previous.asset_symbol.clone());
                (decimals, symbol)
            }
            None => (FALLBACK_DECIMALS, String::new()),
        };

        let one_share = U256::exp10(SHARE_DECIMALS as usize);
        let one_asset = units::one_unit(decimals).unwrap_or(one_share);

        let (total_assets, total_supply, price_per_share, user_shares, preview_deposit, preview_redeem) = futures::join!(
            read_uint(client, vault, ViewCall::TotalAssets),
            read_uint(client, vault, ViewCall::TotalSupply),
            read_uint(client, vault, ViewCall::ConvertToAssets(one_share)),
            async {
                match account {
                    Some(account) => read_uint(client, vault, ViewCall::BalanceOf(account.clone())).await,
                    None => Some(U256::zero()),
                }
            },
            read_uint(client, vault, ViewCall::PreviewDeposit(one_asset)),
            read_uint(client, vault, ViewCall::PreviewRedeem(one_share)),
        );

        let asset_fmt = |value: Option<U256>, fallback: &str| {
            value.map_or_else(|| fallback.to_string(), |v| units::format_units(v, decimals))
        };
        let share_fmt = |value: Option<U256>, fallback: &str| {
            value.map_or_else(|| fallback.to_string(), |v| units::format_units(v, SHARE_DECIMALS))
        };

        let snapshot = VaultSnapshot {
            is_configured: true,
            is_loading: false,
            vault_address: Some(vault.clone()),
            asset_address,
            decimals,
            asset_symbol,
            total_assets: asset_fmt(total_assets, &previous.total_assets),
            total_supply: share_fmt(total_supply, &previous.total_supply),
            price_per_share: asset_fmt(price_per_share, &previous.price_per_share),
            user_shares: share_fmt(user_shares, &previous.user_shares),
            preview_deposit: share_fmt(preview_deposit, &previous.preview_deposit),
            preview_redeem: asset_fmt(preview_redeem, &previous.preview_redeem),
        };

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(%vault, "discarding superseded read-model refresh");
            return state.snapshot.clone();
        }
        state.snapshot = snapshot;
        state.snapshot.clone()
    }
}

async fn read_uint(client: &dyn ChainClient, address: &Address, call: ViewCall) -> Option<U256> {
    match client.read_call(address, &call, None).await {
        Ok(value) => match value.into_uint() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(call = call.name(), error = %e, "unexpected return type");
                None
            }
        },
        Err(e) => {
            warn!(call = call.name(), error = %e, "read failed");
            None
        }
    }
}
