//! Periodic maintenance sweeps.
//!
//! Each sweep runs on a fixed interval under a named lease, so only one
//! worker instance executes it at a time even when several are deployed.
//! A sweep that loses the lease simply skips the tick — the holder (or the
//! next tick after the holder's TTL lapses) covers the work.

use std::time::Duration;

use chrono::Utc;
use courtside_core::lifecycle::{application, EntityKind};
use courtside_db::repositories::{
    ApplicationRepo, LeaseRepo, PassRepo, TransitionOutcome, TransitionRepo,
};
use courtside_db::DbPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// How often the stale-draft sweep runs.
const DRAFT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// How often the pass-expiry sweep runs.
const PASS_SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Drafts older than this many days are canceled.
const DEFAULT_DRAFT_MAX_AGE_DAYS: i64 = 14;

/// Maximum drafts canceled per tick.
const DRAFT_SWEEP_BATCH: i64 = 500;

/// Lease TTL; comfortably longer than one sweep tick's work.
const LEASE_TTL_SECS: f64 = 300.0;

const DRAFT_SWEEP_LEASE: &str = "maintenance.draft_sweep";
const PASS_SWEEP_LEASE: &str = "maintenance.pass_expiry";

/// Cancel draft applications that were abandoned.
///
/// Each stale draft goes through the normal guarded transition: a draft
/// the customer submits mid-sweep wins its race and is left alone.
pub async fn run_draft_sweep(pool: DbPool, cancel: CancellationToken) {
    let max_age_days: i64 = std::env::var("DRAFT_MAX_AGE_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DRAFT_MAX_AGE_DAYS);
    let owner = Uuid::new_v4().to_string();

    tracing::info!(
        max_age_days,
        interval_secs = DRAFT_SWEEP_INTERVAL.as_secs(),
        "Stale-draft sweep started"
    );

    let mut interval = tokio::time::interval(DRAFT_SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale-draft sweep stopping");
                let _ = LeaseRepo::release(&pool, DRAFT_SWEEP_LEASE, &owner).await;
                break;
            }
            _ = interval.tick() => {
                match LeaseRepo::acquire(&pool, DRAFT_SWEEP_LEASE, &owner, LEASE_TTL_SECS).await {
                    Ok(true) => {
                        if let Err(e) = sweep_stale_drafts(&pool, max_age_days).await {
                            tracing::error!(error = %e, "Stale-draft sweep failed");
                        }
                    }
                    Ok(false) => {
                        tracing::debug!("Stale-draft sweep lease held elsewhere; skipping tick");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stale-draft sweep lease acquisition failed");
                    }
                }
            }
        }
    }
}

async fn sweep_stale_drafts(pool: &DbPool, max_age_days: i64) -> Result<(), sqlx::Error> {
    let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
    let stale = ApplicationRepo::list_stale_drafts(pool, cutoff, DRAFT_SWEEP_BATCH).await?;
    if stale.is_empty() {
        tracing::debug!("Stale-draft sweep: nothing to do");
        return Ok(());
    }

    let mut canceled = 0u64;
    for draft in &stale {
        let outcome = TransitionRepo::transition(
            pool,
            EntityKind::Application,
            draft.id,
            application::DRAFT,
            application::CANCELED,
            None,
            Some("stale draft cleanup"),
        )
        .await?;
        if outcome == TransitionOutcome::Applied {
            canceled += 1;
        }
    }

    tracing::info!(found = stale.len(), canceled, "Stale-draft sweep: canceled old drafts");
    Ok(())
}

/// Flip active passes past their expiry to `expired`.
pub async fn run_pass_expiry_sweep(pool: DbPool, cancel: CancellationToken) {
    let owner = Uuid::new_v4().to_string();

    tracing::info!(
        interval_secs = PASS_SWEEP_INTERVAL.as_secs(),
        "Pass-expiry sweep started"
    );

    let mut interval = tokio::time::interval(PASS_SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Pass-expiry sweep stopping");
                let _ = LeaseRepo::release(&pool, PASS_SWEEP_LEASE, &owner).await;
                break;
            }
            _ = interval.tick() => {
                match LeaseRepo::acquire(&pool, PASS_SWEEP_LEASE, &owner, LEASE_TTL_SECS).await {
                    Ok(true) => {
                        match PassRepo::mark_expired_batch(&pool).await {
                            Ok(expired) if expired > 0 => {
                                tracing::info!(expired, "Pass-expiry sweep: passes expired");
                            }
                            Ok(_) => {
                                tracing::debug!("Pass-expiry sweep: nothing to do");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Pass-expiry sweep failed");
                            }
                        }
                    }
                    Ok(false) => {
                        tracing::debug!("Pass-expiry sweep lease held elsewhere; skipping tick");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Pass-expiry sweep lease acquisition failed");
                    }
                }
            }
        }
    }
}
