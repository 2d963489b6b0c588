use parking_lot::Mutex;
use primitive_types::U256;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::CoreError;
use crate::models::action::{ActionKind, ActionQuote};
use crate::models::chain::{Address, TxReceipt, TxStatus, ViewCall, WriteCall};
use crate::providers::traits::ChainClient;
use crate::units;

/// Render the faucet cooldown: "Ready", whole minutes under an hour, else hours.
pub fn format_cooldown(seconds: U256) -> String {
    if seconds.is_zero() {
        return "Ready".to_string();
    }
    let minutes = units::to_f64(seconds, 0) / 60.0;
    if minutes < 60.0 {
        return format!("{}m", minutes.ceil() as u64);
    }
    format!("{:.1}h", minutes / 60.0)
}

/// Write path: approve, deposit, withdraw and faucet mint.
///
/// Failures are reported as [`CoreError::Action`] naming the action, and
/// never touch read-side state.
pub struct ActionService {
    client: Mutex<Arc<dyn ChainClient>>,
}

impl ActionService {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    pub fn set_client(&self, client: Arc<dyn ChainClient>) {
        *self.client.lock() = client;
    }

    fn client(&self) -> Arc<dyn ChainClient> {
        self.client.lock().clone()
    }

    /// Everything the deposit/withdraw form shows for `amount_text`.
    ///
    /// The amount must parse with the asset's precision and be positive;
    /// individual reads that fail count as zero / no preview.
    pub async fn quote(
        &self,
        vault: &Address,
        asset: &Address,
        account: &Address,
        amount_text: &str,
        decimals: u8,
    ) -> Result<ActionQuote, CoreError> {
        let amount = units::parse_units(amount_text, decimals)?;
        if amount.is_zero() {
            return Err(CoreError::InvalidAmount {
                input: amount_text.to_string(),
                reason: "amount must be greater than zero".into(),
            });
        }

        let client = self.client();
        let client = client.as_ref();
        let (wallet_balance, allowance, preview_deposit, preview_withdraw, max_withdraw) = futures::join!(
            read_uint(client, asset, ViewCall::BalanceOf(account.clone())),
            read_uint(
                client,
                asset,
                ViewCall::Allowance {
                    owner: account.clone(),
                    spender: vault.clone(),
                },
            ),
            read_uint(client, vault, ViewCall::PreviewDeposit(amount)),
            read_uint(client, vault, ViewCall::PreviewWithdraw(amount)),
            read_uint(client, vault, ViewCall::MaxWithdraw(account.clone())),
        );

        let wallet_balance = wallet_balance.unwrap_or_default();
        let allowance = allowance.unwrap_or_default();
        let max_withdraw = max_withdraw.unwrap_or_default();

        Ok(ActionQuote {
            amount,
            wallet_balance,
            allowance,
            needs_approval: amount > allowance,
            preview_deposit_shares: preview_deposit,
            preview_withdraw_shares: preview_withdraw,
            max_withdraw,
            exceeds_max_withdraw: amount > max_withdraw,
            max_deposit_display: units::format_units(wallet_balance, decimals),
            max_withdraw_display: units::format_units(max_withdraw, decimals),
        })
    }

    /// Let the vault pull `amount` of the asset.
    pub async fn approve(&self, asset: &Address, vault: &Address, amount: U256) -> Result<TxReceipt, CoreError> {
        let call = WriteCall::Approve {
            spender: vault.clone(),
            amount,
        };
        self.submit(ActionKind::Approval, asset, &call).await
    }

    /// Deposit `assets` and mint the shares to `receiver`.
    pub async fn deposit(&self, vault: &Address, assets: U256, receiver: &Address) -> Result<TxReceipt, CoreError> {
        let call = WriteCall::Deposit {
            assets,
            receiver: receiver.clone(),
        };
        self.submit(ActionKind::Deposit, vault, &call).await
    }

    /// Withdraw `assets` from `account`'s position back to `account`.
    pub async fn withdraw(&self, vault: &Address, assets: U256, account: &Address) -> Result<TxReceipt, CoreError> {
        let call = WriteCall::Withdraw {
            assets,
            receiver: account.clone(),
            owner: account.clone(),
        };
        self.submit(ActionKind::Withdraw, vault, &call).await
    }

    pub async fn mint_faucet(&self, asset: &Address) -> Result<TxReceipt, CoreError> {
        self.submit(ActionKind::Mint, asset, &WriteCall::MintFaucet).await
    }

    /// Seconds until `account` may mint from the faucet again.
    pub async fn faucet_cooldown(&self, asset: &Address, account: &Address) -> Result<U256, CoreError> {
        self.client()
            .read_call(asset, &ViewCall::RemainingCooldown(account.clone()), None)
            .await?
            .into_uint()
    }

    async fn submit(&self, kind: ActionKind, target: &Address, call: &WriteCall) -> Result<TxReceipt, CoreError> {
        let client = self.client();
        let tx = client
            .submit_transaction(target, call)
            .await
            .map_err(|e| CoreError::action(kind, e))?;
        info!(action = %kind, %tx, "transaction submitted, waiting for confirmation");

        let receipt = client
            .await_confirmation(&tx)
            .await
            .map_err(|e| CoreError::action(kind, e))?;

        if receipt.status == TxStatus::Reverted {
            warn!(action = %kind, %tx, "transaction reverted");
            return Err(CoreError::Action {
                action: kind,
                message: format!("transaction {tx} reverted"),
            });
        }
        info!(action = %kind, %tx, block = receipt.block_height, "transaction confirmed");
        Ok(receipt)
    }
}

async fn read_uint(client: &dyn ChainClient, address: &Address, call: ViewCall) -> Option<U256> {
    client
        .read_call(address, &call, None)
        .await
        .and_then(|v| v.into_uint())
        .map_err(|e| warn!(call = call.name(), error = %e, "quote read failed"))
        .ok()
}
