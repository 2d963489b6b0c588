pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod units;

use models::{
    activity::ActivityFeed,
    chain::{Address, LogEntry, TxReceipt},
    action::ActionQuote,
    chart::VaultSeries,
    event::EventFeed,
    read_model::VaultSnapshot,
    settings::EngineConfig,
};
use primitive_types::U256;
use providers::{json_rpc::JsonRpcClient, traits::ChainClient};
use services::{
    action_service::ActionService,
    activity_service,
    event_store::{EventStore, IngestOutcome, LiveWatch, LoadOutcome},
    read_model_service::ReadModelAdapter,
    series_service::SeriesBuilder,
};
use std::sync::Arc;
use tracing::info;

use errors::CoreError;

/// Main entry point for the Vault Lens core library.
/// Owns the chain client and the three engine components that read from it.
#[must_use]
pub struct VaultLens {
    config: EngineConfig,
    client: Arc<dyn ChainClient>,
    events: Arc<EventStore>,
    series: SeriesBuilder,
    read_model: ReadModelAdapter,
    actions: ActionService,
    /// Running live subscription, if any. Dropping it stops ingestion.
    live: Option<LiveWatch>,
}

impl std::fmt::Debug for VaultLens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultLens")
            .field("client", &self.client.name())
            .field("vault", &self.config.vault_address)
            .field("account", &self.config.account)
            .field("events", &self.events.feed().events.len())
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl VaultLens {
    /// Build the engine around an injected chain client.
    pub fn new(config: EngineConfig, client: Arc<dyn ChainClient>) -> Result<Self, CoreError> {
        config.validate()?;
        let events = Arc::new(EventStore::new(Arc::clone(&client), &config));
        events.set_target(config.vault_address.clone());

        Ok(Self {
            series: SeriesBuilder::new(Arc::clone(&client), &config),
            read_model: ReadModelAdapter::new(Arc::clone(&client)),
            actions: ActionService::new(Arc::clone(&client)),
            events,
            client,
            config,
            live: None,
        })
    }

    /// Build the engine over the JSON-RPC endpoint named in `config`.
    pub fn connect(config: EngineConfig) -> Result<Self, CoreError> {
        let client = Arc::new(JsonRpcClient::from_config(&config));
        Self::new(config, client)
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── Targets ─────────────────────────────────────────────────────

    /// Point the engine at another vault (or none).
    /// Stops the live watch; callers reload events and the read model afterwards.
    pub fn set_vault_address(&mut self, vault: Option<Address>) {
        if self.config.vault_address == vault {
            return;
        }
        info!(from = ?self.config.vault_address, to = ?vault, "vault target changed");
        self.live = None;
        self.config.vault_address = vault.clone();
        self.events.set_target(vault);
    }

    /// Change the connected account. Only the read model and the write path
    /// depend on it.
    pub fn set_account(&mut self, account: Option<Address>) {
        self.config.account = account;
    }

    /// Swap the chain client everywhere. In-flight work against the old client
    /// is discarded.
    pub fn set_client(&mut self, client: Arc<dyn ChainClient>) {
        info!(client = client.name(), "chain client changed");
        self.live = None;
        self.events.set_client(Arc::clone(&client));
        self.series.set_client(Arc::clone(&client));
        self.read_model.set_client(Arc::clone(&client));
        self.actions.set_client(Arc::clone(&client));
        self.client = client;
    }

    // ── Engine ──────────────────────────────────────────────────────

    /// Re-read every vault scalar for the current account.
    pub async fn refresh_read_model(&self) -> VaultSnapshot {
        self.read_model
            .refresh(self.config.vault_address.as_ref(), self.config.account.as_ref())
            .await
    }

    /// Replace the working set with the recent historical window.
    pub async fn load_events(&self) -> Result<LoadOutcome, CoreError> {
        self.events.load_recent(self.config.vault_address.clone()).await
    }

    /// Merge a batch of live logs into the working set.
    pub async fn ingest_live(&self, batch: Vec<LogEntry>) -> IngestOutcome {
        self.events.ingest_live(batch).await
    }

    /// Rebuild the series if the events, decimals or target changed.
    /// Returns whether a new build was committed.
    pub async fn refresh_series(&self) -> bool {
        // Revision first: a merge landing in between only causes one extra rebuild.
        let revision = self.events.revision();
        let feed = self.events.feed();
        self.series
            .refresh(
                self.config.vault_address.as_ref(),
                self.read_model.decimals(),
                revision,
                &feed.events,
            )
            .await
    }

    /// Start feeding live Deposit/Withdraw batches into the working set.
    /// Returns `false` when no vault is configured.
    pub async fn watch_live(&mut self) -> Result<bool, CoreError> {
        self.live = None;
        self.live = self.events.watch().await?;
        Ok(self.live.is_some())
    }

    #[must_use]
    pub fn is_watching(&self) -> bool {
        self.live.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the live watch and mark every in-flight load stale.
    pub fn shutdown(&mut self) {
        self.live = None;
        self.events.shutdown();
        info!("vault lens shut down");
    }

    // ── Snapshots ───────────────────────────────────────────────────

    #[must_use]
    pub fn events(&self) -> EventFeed {
        self.events.feed()
    }

    #[must_use]
    pub fn series(&self) -> VaultSeries {
        self.series.series(self.events.is_loading())
    }

    #[must_use]
    pub fn read_model(&self) -> VaultSnapshot {
        self.read_model.snapshot()
    }

    /// Activity rows for the current working set (sample rows while empty).
    #[must_use]
    pub fn activity_feed(&self) -> ActivityFeed {
        let snapshot = self.read_model.snapshot();
        activity_service::build_activity_feed(
            &self.events.feed(),
            snapshot.decimals,
            &snapshot.asset_symbol,
            &self.config,
            chrono::Utc::now().timestamp(),
        )
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// Quote a deposit/withdraw of `amount_text` for the connected account.
    pub async fn quote(&self, amount_text: &str) -> Result<ActionQuote, CoreError> {
        let (vault, asset, account) = self.action_context()?;
        let decimals = self.read_model.decimals();
        self.actions
            .quote(&vault, &asset, &account, amount_text, decimals)
            .await
    }

    pub async fn approve(&self, amount: U256) -> Result<TxReceipt, CoreError> {
        let (vault, asset, _) = self.action_context()?;
        self.actions.approve(&asset, &vault, amount).await
    }

    /// Deposit and refresh the read model once confirmed.
    pub async fn deposit(&self, amount: U256) -> Result<TxReceipt, CoreError> {
        let (vault, _, account) = self.action_context()?;
        let receipt = self.actions.deposit(&vault, amount, &account).await?;
        self.refresh_read_model().await;
        Ok(receipt)
    }

    /// Withdraw and refresh the read model once confirmed.
    pub async fn withdraw(&self, amount: U256) -> Result<TxReceipt, CoreError> {
        let (vault, _, account) = self.action_context()?;
        let receipt = self.actions.withdraw(&vault, amount, &account).await?;
        self.refresh_read_model().await;
        Ok(receipt)
    }

    pub async fn mint_faucet(&self) -> Result<TxReceipt, CoreError> {
        let (_, asset, _) = self.action_context()?;
        self.actions.mint_faucet(&asset).await
    }

    /// Seconds until the connected account may mint from the faucet again.
    pub async fn faucet_cooldown(&self) -> Result<U256, CoreError> {
        let (_, asset, account) = self.action_context()?;
        self.actions.faucet_cooldown(&asset, &account).await
    }

    #[must_use]
    pub fn action_service(&self) -> &ActionService {
        &self.actions
    }

    /// Vault, resolved asset and account, all required by the write path.
    fn action_context(&self) -> Result<(Address, Address, Address), CoreError> {
        let vault = self
            .config
            .vault_address
            .clone()
            .ok_or_else(|| CoreError::ValidationError("no vault configured".into()))?;
        let account = self
            .config
            .account
            .clone()
            .ok_or_else(|| CoreError::ValidationError("no account connected".into()))?;
        let snapshot = self.read_model.snapshot();
        let asset = snapshot
            .asset_address
            .filter(|_| snapshot.vault_address.as_ref() == Some(&vault))
            .ok_or_else(|| {
                CoreError::ValidationError("asset address not resolved; refresh the read model".into())
            })?;
        Ok((vault, asset, account))
    }
}
