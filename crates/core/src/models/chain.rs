use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::event::EventKind;
use crate::errors::CoreError;

/// A 20-byte account or contract address, stored as lowercase `0x`-prefixed hex.
///
/// The engine treats addresses as opaque identifiers; validation only
/// guarantees the textual shape so that equality comparisons are reliable
/// regardless of the checksum casing the caller used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn zero() -> Self {
        Address(format!("0x{}", "0".repeat(40)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hex digits without the `0x` prefix.
    pub fn hex_digits(&self) -> &str {
        &self.0[2..]
    }

    /// `0x1234...abcd` form used in activity listings.
    pub fn shorten(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| CoreError::InvalidAddress(format!("'{s}' is missing the 0x prefix")))?;
        if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::InvalidAddress(format!(
                "'{s}' must be 40 hexadecimal characters after 0x"
            )));
        }
        Ok(Address(format!("0x{}", digits.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transaction hash. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A decoded Deposit/Withdraw log as delivered by the chain client,
/// either from a historical query or a live subscription batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Contract that emitted the log
    pub address: Address,
    pub kind: EventKind,
    pub initiator: Address,
    pub owner: Address,
    /// Withdraw receiver; `None` for deposits
    pub beneficiary: Option<Address>,
    pub asset_amount: U256,
    pub share_amount: U256,
    pub transaction_id: TxHash,
    /// `None` while the log is still pending
    pub block_height: Option<u64>,
    /// `None` while the log is still pending
    pub log_position: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    /// Unix seconds
    pub timestamp: i64,
}

/// Read-only contract calls the engine issues against the vault or its asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    /// Vault → underlying asset address
    Asset,
    TotalAssets,
    TotalSupply,
    ConvertToAssets(U256),
    ConvertToShares(U256),
    BalanceOf(Address),
    Allowance { owner: Address, spender: Address },
    MaxWithdraw(Address),
    Decimals,
    Symbol,
    PreviewDeposit(U256),
    PreviewRedeem(U256),
    PreviewWithdraw(U256),
    /// Faucet token: seconds until `account` may mint again
    RemainingCooldown(Address),
}

impl ViewCall {
    pub fn name(&self) -> &'static str {
        match self {
            ViewCall::Asset => "asset",
            ViewCall::TotalAssets => "totalAssets",
            ViewCall::TotalSupply => "totalSupply",
            ViewCall::ConvertToAssets(_) => "convertToAssets",
            ViewCall::ConvertToShares(_) => "convertToShares",
            ViewCall::BalanceOf(_) => "balanceOf",
            ViewCall::Allowance { .. } => "allowance",
            ViewCall::MaxWithdraw(_) => "maxWithdraw",
            ViewCall::Decimals => "decimals",
            ViewCall::Symbol => "symbol",
            ViewCall::PreviewDeposit(_) => "previewDeposit",
            ViewCall::PreviewRedeem(_) => "previewRedeem",
            ViewCall::PreviewWithdraw(_) => "previewWithdraw",
            ViewCall::RemainingCooldown(_) => "remainingCooldown",
        }
    }
}

/// State-changing calls submitted on behalf of the connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCall {
    Approve { spender: Address, amount: U256 },
    Deposit { assets: U256, receiver: Address },
    Withdraw { assets: U256, receiver: Address, owner: Address },
    MintFaucet,
}

/// Decoded return value of a [`ViewCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallValue {
    Uint(U256),
    Address(Address),
    Text(String),
}

impl CallValue {
    pub fn into_uint(self) -> Result<U256, CoreError> {
        match self {
            CallValue::Uint(v) => Ok(v),
            other => Err(CoreError::Decode(format!("expected uint256, got {other:?}"))),
        }
    }

    pub fn into_address(self) -> Result<Address, CoreError> {
        match self {
            CallValue::Address(a) => Ok(a),
            other => Err(CoreError::Decode(format!("expected address, got {other:?}"))),
        }
    }

    pub fn into_text(self) -> Result<String, CoreError> {
        match self {
            CallValue::Text(s) => Ok(s),
            other => Err(CoreError::Decode(format!("expected string, got {other:?}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Success,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_id: TxHash,
    pub block_height: u64,
    pub status: TxStatus,
}
