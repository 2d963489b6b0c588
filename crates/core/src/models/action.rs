use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// User-initiated write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Approval,
    Deposit,
    Withdraw,
    Mint,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionKind::Approval => write!(f, "Approval"),
            ActionKind::Deposit => write!(f, "Deposit"),
            ActionKind::Withdraw => write!(f, "Withdraw"),
            ActionKind::Mint => write!(f, "Mint"),
        }
    }
}

/// Everything the deposit/withdraw form needs before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionQuote {
    /// Parsed amount in the asset's smallest unit
    pub amount: U256,

    /// Wallet balance of the underlying asset
    pub wallet_balance: U256,

    /// Current allowance granted to the vault
    pub allowance: U256,

    /// `amount > allowance`: deposit must be preceded by an approval
    pub needs_approval: bool,

    /// Shares minted by depositing `amount`, if the preview succeeded
    pub preview_deposit_shares: Option<U256>,

    /// Shares burned by withdrawing `amount`, if the preview succeeded
    pub preview_withdraw_shares: Option<U256>,

    pub max_withdraw: U256,

    /// `amount > max_withdraw`
    pub exceeds_max_withdraw: bool,

    /// Display string for the deposit MAX button (wallet balance)
    pub max_deposit_display: String,

    /// Display string for the withdraw MAX button
    pub max_withdraw_display: String,
}
