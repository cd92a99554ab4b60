//! Derived views over the job collection: batch summary, control
//! availability and the batch-level status line.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::Job;

/// Shown in place of the elapsed time before any batch has started.
pub const ELAPSED_PLACEHOLDER: &str = "—";

/// Aggregate counts over the current queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default, with = "elapsed_millis")]
    pub elapsed: Option<Duration>,
}

impl BatchSummary {
    /// Recomputes the summary from scratch.
    pub fn compute(jobs: &[Job], started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let elapsed = started_at.map(|start| (now - start).to_std().unwrap_or(Duration::ZERO));
        Self {
            total: jobs.len(),
            succeeded: jobs.iter().filter(|j| j.is_done()).count(),
            failed: jobs.iter().filter(|j| j.is_failed()).count(),
            elapsed,
        }
    }

    pub fn elapsed_display(&self) -> String {
        match self.elapsed {
            Some(elapsed) => format_elapsed(elapsed),
            None => ELAPSED_PLACEHOLDER.to_string(),
        }
    }
}

/// Formats a duration as `{s}s` or `{m}m {s}s`, rounding to the nearest second.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = (elapsed.as_millis() + 500) / 1000;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Which queue-level actions are currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub can_start: bool,
    pub can_clear_queue: bool,
    pub can_download_all: bool,
    pub can_clear_completed: bool,
}

impl Controls {
    pub fn compute(jobs: &[Job], processing: bool) -> Self {
        let any_done = jobs.iter().any(|j| j.is_done());
        let idle_with_jobs = !processing && !jobs.is_empty();
        Self {
            can_start: idle_with_jobs,
            can_clear_queue: idle_with_jobs,
            can_download_all: any_done,
            can_clear_completed: !processing && any_done,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    #[default]
    Info,
    Success,
    Error,
}

/// Batch-level status text reflecting the most recent outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLine {
    pub message: String,
    pub level: StatusLevel,
}

impl StatusLine {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Info,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: StatusLevel::Error,
        }
    }
}

mod elapsed_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
