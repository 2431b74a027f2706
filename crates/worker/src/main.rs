//! Maintenance worker: stale-draft cleanup and pass-expiry sweeps.

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod sweeps;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courtside_worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let pool = courtside_db::create_pool(&database_url).await?;
    courtside_db::health_check(&pool).await?;

    tracing::info!("Maintenance worker starting");

    let cancel = CancellationToken::new();

    let draft_sweep = tokio::spawn(sweeps::run_draft_sweep(pool.clone(), cancel.clone()));
    let pass_sweep = tokio::spawn(sweeps::run_pass_expiry_sweep(pool, cancel.clone()));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    cancel.cancel();

    let _ = draft_sweep.await;
    let _ = pass_sweep.await;

    Ok(())
}
