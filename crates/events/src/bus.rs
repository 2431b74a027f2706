//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`DomainEvent`]s. It is
//! designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use courtside_core::lifecycle::{self, EntityKind};
use courtside_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// A domain event produced by a committed state change.
///
/// Constructed via [`DomainEvent::transition`] for lifecycle changes or
/// [`DomainEvent::new`] for everything else, then enriched with the builder
/// methods [`with_actor`](DomainEvent::with_actor) and
/// [`with_payload`](DomainEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"rental.out"`.
    pub event_type: String,

    /// Entity kind the event originated from (e.g. `"order"`).
    pub entity_kind: String,

    /// Source entity database id.
    pub entity_id: DbId,

    /// Lifecycle status the entity left, when the event is a transition.
    pub from_status_id: Option<i16>,

    /// Lifecycle status the entity entered, when the event is a transition.
    pub to_status_id: Option<i16>,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    /// Create an event with an explicit type name.
    pub fn new(event_type: impl Into<String>, entity_kind: EntityKind, entity_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            entity_kind: entity_kind.as_str().to_string(),
            entity_id,
            from_status_id: None,
            to_status_id: None,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Create the canonical transition event for an applied guarded update.
    ///
    /// The event type is `"<kind>.<target status name>"`, e.g.
    /// `"application.in_progress"`.
    pub fn transition(entity_kind: EntityKind, entity_id: DbId, from: i16, to: i16) -> Self {
        let mut event = Self::new(
            format!(
                "{}.{}",
                entity_kind.as_str(),
                lifecycle::status_name(entity_kind, to)
            ),
            entity_kind,
            entity_id,
        );
        event.from_status_id = Some(from);
        event.to_status_id = Some(to);
        event
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`DomainEvent`].
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped —
    /// notification delivery never gates a committed transition.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
