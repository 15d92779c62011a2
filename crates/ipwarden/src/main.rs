//! ipwarden - pins Linode firewall allow-list rules to your public IP.
//!
//! Runs one reconciliation pass at startup, then one every 15 minutes, until
//! the process is killed.

use anyhow::Result;
use ipwarden::{EnvSource, Reconciler, Scheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time between scheduled passes
const SYNC_INTERVAL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let reconciler = Arc::new(Reconciler::new(EnvSource::new()));
    reconciler.run_pass().await;

    let mut scheduler = Scheduler::new();
    scheduler.register(reconciler.into_task("firewall-sync", SYNC_INTERVAL))?;
    let _running = scheduler.run();

    std::future::pending::<()>().await;
    Ok(())
}
