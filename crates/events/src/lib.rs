//! Courtside event bus.
//!
//! Transition events are published here fire-and-forget after every applied
//! guarded update. The (external) notification dispatcher subscribes and
//! turns them into customer email/SMS; a publish with zero subscribers is
//! silently dropped and never affects the transition that produced it.

pub mod bus;

pub use bus::{DomainEvent, EventBus};
