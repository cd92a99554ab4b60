//! Queue event broadcaster for real-time queue state streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::queue::{BatchOutcome, BatchSummary, Controls, Job, JobId, JobStatus, StatusLine};

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// What changed in the queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum QueueEventKind {
    JobsAdded { jobs: Vec<Job> },
    /// Full snapshot of the job after the change.
    JobUpdated { job: Job },
    JobRemoved { job_id: JobId },
    QueueCleared,
    CompletedCleared { removed: usize },
    BatchStarted,
    BatchFinished { outcome: BatchOutcome },
    RetryFinished { job_id: JobId, status: JobStatus },
    SettingsChanged,
    /// An operation was refused; nothing changed.
    Rejected { reason: String },
}

/// A queue change plus freshly derived views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEvent {
    pub kind: QueueEventKind,
    pub summary: BatchSummary,
    pub controls: Controls,
    pub status: StatusLine,
    pub timestamp: DateTime<Utc>,
}

impl QueueEvent {
    pub fn new(
        kind: QueueEventKind,
        summary: BatchSummary,
        controls: Controls,
        status: StatusLine,
    ) -> Self {
        Self {
            kind,
            summary,
            controls,
            status,
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts queue events to any number of subscribers.
#[derive(Clone)]
pub struct QueueEventBroadcaster {
    sender: Arc<broadcast::Sender<QueueEvent>>,
}

impl QueueEventBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends an event to all subscribers.
    pub fn send(&self, event: QueueEvent) {
        // Ignore errors - no active receivers is fine
        let _ = self.sender.send(event);
    }

    /// Creates a new subscriber for queue events.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for QueueEventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
