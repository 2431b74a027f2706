//! Stringing application flows.

use courtside_core::error::CoreError;
use courtside_core::lifecycle::EntityKind;
use courtside_core::types::{DbId, Timestamp};
use courtside_db::is_unique_violation;
use courtside_db::models::application::{Application, CreateApplication};
use courtside_db::models::service_pass::SERVICE_TYPE_STRINGING;
use courtside_db::models::status::ApplicationStatus;
use courtside_db::repositories::{
    ApplicationRepo, ConsumeOutcome, PassRepo, TransitionOutcome, TransitionRepo,
};
use courtside_events::{DomainEvent, EventBus};
use sqlx::PgPool;
use validator::Validate;

use crate::error::{check_transition, FlowResult};
use crate::slots;

/// Create a draft application.
///
/// The partial unique indexes allow at most one draft per linked order and
/// one per linked rental; a second draft comes back as `Conflict`.
pub async fn create_draft(pool: &PgPool, input: &CreateApplication) -> FlowResult<Application> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;

    match ApplicationRepo::create_draft(pool, input).await {
        Ok(application) => {
            tracing::info!(application_id = application.id, "Draft application created");
            Ok(application)
        }
        Err(err) if is_unique_violation(&err, "uq_applications_one_draft") => Err(
            CoreError::Conflict("a draft application already exists for this link".to_string())
                .into(),
        ),
        Err(err) => Err(err.into()),
    }
}

/// Customer submits the draft: validate the requested slot, then
/// draft → submitted.
///
/// The capacity check happens here, at booking time — not only when the
/// calendar was rendered.
pub async fn submit(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
    now: Timestamp,
) -> FlowResult<TransitionOutcome> {
    let application = require(pool, application_id).await?;

    slots::validate_booking(
        pool,
        application.preferred_date,
        application.preferred_time,
        now,
    )
    .await?;

    simple_transition(
        pool,
        bus,
        application_id,
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        actor_id,
    )
    .await
}

/// Admin picks the application up: submitted → reviewing.
pub async fn start_review(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        application_id,
        ApplicationStatus::Submitted,
        ApplicationStatus::Reviewing,
        actor_id,
    )
    .await
}

/// Admin accepts the booking: reviewing → accepted.
pub async fn accept(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        application_id,
        ApplicationStatus::Reviewing,
        ApplicationStatus::Accepted,
        actor_id,
    )
    .await
}

/// Stringing begins: accepted → in_progress, then consume a pass session
/// when the customer chose to pay with their pass.
///
/// Entitlement is checked before the transition so the customer sees
/// `InsufficientBalance` instead of a half-started job; the consumption
/// itself still runs as the post-commit effect and is exactly-once.
pub async fn start(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let application = require(pool, application_id).await?;

    if application.use_pass && application.used_pass_id.is_none() {
        let user_id = application.user_id.ok_or_else(|| {
            CoreError::Validation("a pass can only be used by a registered customer".to_string())
        })?;
        if PassRepo::find_active_for(pool, user_id, SERVICE_TYPE_STRINGING)
            .await?
            .is_none()
        {
            return Err(CoreError::InsufficientBalance.into());
        }
    }

    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Application,
        application_id,
        ApplicationStatus::Accepted.id(),
        ApplicationStatus::InProgress.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(
        outcome,
        EntityKind::Application,
        application_id,
        ApplicationStatus::Accepted.id(),
        ApplicationStatus::InProgress.id(),
    )?;

    if outcome == TransitionOutcome::Applied {
        run_start_effects(pool, application_id).await?;
        bus.publish(
            DomainEvent::transition(
                EntityKind::Application,
                application_id,
                ApplicationStatus::Accepted.id(),
                ApplicationStatus::InProgress.id(),
            )
            .with_actor(actor_id),
        );
    }

    Ok(outcome)
}

/// Effects for an in-progress application. Idempotent end to end, so crash
/// recovery can re-run it for any application already in `in_progress`.
pub async fn run_start_effects(pool: &PgPool, application_id: DbId) -> FlowResult<()> {
    let application = require(pool, application_id).await?;
    if !application.use_pass {
        return Ok(());
    }

    let user_id = application.user_id.ok_or_else(|| {
        CoreError::Validation("a pass can only be used by a registered customer".to_string())
    })?;

    // A retried effect reuses the pass it already consumed from; a fresh
    // one draws from the soonest-expiring active pass.
    let pass_id = match application.used_pass_id {
        Some(pass_id) => pass_id,
        None => PassRepo::find_active_for(pool, user_id, SERVICE_TYPE_STRINGING)
            .await?
            .ok_or(CoreError::InsufficientBalance)?
            .id,
    };

    match PassRepo::consume(pool, pass_id, application_id).await? {
        ConsumeOutcome::Consumed(_) | ConsumeOutcome::Replayed(_) => {
            ApplicationRepo::set_used_pass(pool, application_id, pass_id).await?;
            Ok(())
        }
        ConsumeOutcome::InsufficientBalance => Err(CoreError::InsufficientBalance.into()),
        ConsumeOutcome::PassNotFound => Err(CoreError::NotFound {
            entity: "ServicePass",
            id: pass_id,
        }
        .into()),
    }
}

/// Work done: in_progress → completed.
pub async fn complete(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        application_id,
        ApplicationStatus::InProgress,
        ApplicationStatus::Completed,
        actor_id,
    )
    .await
}

/// Customer abandons a draft: draft → canceled.
pub async fn cancel_draft(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    simple_transition(
        pool,
        bus,
        application_id,
        ApplicationStatus::Draft,
        ApplicationStatus::Canceled,
        actor_id,
    )
    .await
}

async fn require(pool: &PgPool, application_id: DbId) -> FlowResult<Application> {
    Ok(ApplicationRepo::find_by_id(pool, application_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id: application_id,
        })?)
}

/// Shared effect-free transition + event emission.
async fn simple_transition(
    pool: &PgPool,
    bus: &EventBus,
    application_id: DbId,
    expected: ApplicationStatus,
    next: ApplicationStatus,
    actor_id: DbId,
) -> FlowResult<TransitionOutcome> {
    let outcome = TransitionRepo::transition(
        pool,
        EntityKind::Application,
        application_id,
        expected.id(),
        next.id(),
        Some(actor_id),
        None,
    )
    .await?;
    let outcome = check_transition(
        outcome,
        EntityKind::Application,
        application_id,
        expected.id(),
        next.id(),
    )?;

    if outcome == TransitionOutcome::Applied {
        bus.publish(
            DomainEvent::transition(EntityKind::Application, application_id, expected.id(), next.id())
                .with_actor(actor_id),
        );
    }

    Ok(outcome)
}
