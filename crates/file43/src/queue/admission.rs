//! Admission filtering for candidate files.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::format::supported_input_extension;

use super::job::{JobId, SourceRef};

/// Result of splitting a submission into accepted and dropped files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPlan {
    /// Accepted candidates in submission order.
    pub accepted: Vec<SourceRef>,
    pub dropped_unsupported: usize,
    pub dropped_over_capacity: usize,
    /// Free slots before this submission.
    pub remaining_slots: usize,
}

impl AdmissionPlan {
    /// Filters by extension, then truncates to the remaining capacity.
    pub fn build<I>(candidates: I, current_len: usize, capacity: usize) -> Self
    where
        I: IntoIterator<Item = SourceRef>,
    {
        let mut supported = Vec::new();
        let mut dropped_unsupported = 0;

        for candidate in candidates {
            if supported_input_extension(Path::new(&candidate.name)).is_some() {
                supported.push(candidate);
            } else {
                dropped_unsupported += 1;
            }
        }

        let remaining_slots = capacity.saturating_sub(current_len);
        let dropped_over_capacity = supported.len().saturating_sub(remaining_slots);
        supported.truncate(remaining_slots);

        Self {
            accepted: supported,
            dropped_unsupported,
            dropped_over_capacity,
            remaining_slots,
        }
    }

    /// True when nothing in the submission had a supported extension.
    pub fn nothing_supported(&self) -> bool {
        self.accepted.is_empty() && self.dropped_over_capacity == 0
    }
}

/// What happened to a submission accepted by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReport {
    pub admitted: Vec<JobId>,
    pub dropped_unsupported: usize,
    pub dropped_over_capacity: usize,
}

impl AdmissionReport {
    pub fn dropped(&self) -> usize {
        self.dropped_unsupported + self.dropped_over_capacity
    }
}

pub(crate) fn capacity_message(remaining: usize, capacity: usize) -> String {
    format!(
        "Only {} more files allowed (max {}). Extra files ignored.",
        remaining, capacity
    )
}

pub(crate) fn queued_message(queue_len: usize) -> String {
    format!("{} file(s) queued. Click \"Start Conversion\".", queue_len)
}
