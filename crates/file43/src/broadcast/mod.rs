//! Broadcasting of queue state changes.
//!
//! Any UI layer (the CLI, a desktop bridge) subscribes here instead of
//! reaching into the orchestrator.

pub mod queue_events;

pub use queue_events::{
    QueueEvent, QueueEventBroadcaster, QueueEventKind, DEFAULT_EVENT_CAPACITY,
};
