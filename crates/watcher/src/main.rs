//! Prints the vault read model, event feed and derived series as JSON lines,
//! then keeps following live Deposit/Withdraw events until Ctrl-C.
//!
//! Configuration comes from `VAULT_*` environment variables; pass `--once`
//! to print a single snapshot and exit.

use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vault_lens_core::models::settings::EngineConfig;
use vault_lens_core::VaultLens;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let once = std::env::args().skip(1).any(|arg| arg == "--once");
    let config = EngineConfig::from_env()?;
    let interval = Duration::from_millis(config.poll_interval_ms);
    info!(rpc = %config.rpc_url, vault = ?config.vault_address, "starting vault watcher");

    let mut lens = VaultLens::connect(config)?;

    let mut snapshot = lens.refresh_read_model().await;
    emit(json!({ "read_model": snapshot }))?;

    if let Err(e) = lens.load_events().await {
        warn!(error = %e, "initial event load failed");
    }
    lens.refresh_series().await;
    emit(json!({ "events": lens.events() }))?;
    emit(json!({ "series": lens.series() }))?;
    emit(json!({ "activity": lens.activity_feed() }))?;

    if once {
        return Ok(());
    }
    if !lens.watch_live().await? {
        warn!("no vault configured (set VAULT_ADDRESS); nothing to watch");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let latest = lens.refresh_read_model().await;
                if latest != snapshot {
                    emit(json!({ "read_model": latest }))?;
                    snapshot = latest;
                }
                if lens.refresh_series().await {
                    emit(json!({ "events": lens.events() }))?;
                    emit(json!({ "series": lens.series() }))?;
                }
                if !lens.is_watching() {
                    warn!("live subscription ended");
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    lens.shutdown();
    Ok(())
}

fn emit(value: Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string(&value)?);
    Ok(())
}
