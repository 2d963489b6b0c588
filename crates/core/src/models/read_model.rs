use serde::{Deserialize, Serialize};

use super::chain::Address;

/// Share token precision. Vault shares always use 18 fraction digits.
pub const SHARE_DECIMALS: u8 = 18;

/// Asset precision assumed until the asset's `decimals()` has been read.
pub const FALLBACK_DECIMALS: u8 = 18;

/// Decimals-normalized, display-ready view of the vault's contract state.
///
/// Asset-denominated values use the asset's precision, share-denominated
/// values use [`SHARE_DECIMALS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSnapshot {
    pub is_configured: bool,
    pub is_loading: bool,
    pub vault_address: Option<Address>,
    pub asset_address: Option<Address>,
    pub decimals: u8,
    pub asset_symbol: String,

    /// Total underlying assets held by the vault (asset precision)
    pub total_assets: String,
    /// Total shares outstanding (share precision)
    pub total_supply: String,
    /// Assets redeemable for one whole share (asset precision)
    pub price_per_share: String,
    /// Connected account's share balance (share precision)
    pub user_shares: String,
    /// Shares minted for one whole asset unit (share precision)
    pub preview_deposit: String,
    /// Assets returned for one whole share (asset precision)
    pub preview_redeem: String,
}

impl VaultSnapshot {
    /// The state reported when no vault address is configured.
    pub fn unconfigured() -> Self {
        Self {
            is_configured: false,
            is_loading: false,
            vault_address: None,
            asset_address: None,
            decimals: FALLBACK_DECIMALS,
            asset_symbol: String::new(),
            total_assets: "0".into(),
            total_supply: "0".into(),
            price_per_share: "0".into(),
            user_shares: "0".into(),
            preview_deposit: "0".into(),
            preview_redeem: "0".into(),
        }
    }

    /// Asset value of the user's shares: `user_shares * price_per_share`.
    pub fn position_value(&self) -> f64 {
        let shares: f64 = self.user_shares.parse().unwrap_or(0.0);
        let price: f64 = self.price_per_share.parse().unwrap_or(0.0);
        shares * price
    }
}

impl Default for VaultSnapshot {
    fn default() -> Self {
        Self::unconfigured()
    }
}
