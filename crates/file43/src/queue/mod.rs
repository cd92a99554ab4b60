//! The conversion queue: jobs, admission, sequential execution and the
//! derived batch views.

pub mod admission;
pub mod job;
pub mod orchestrator;
pub mod summary;

pub use admission::{AdmissionPlan, AdmissionReport};
pub use job::{
    Job, JobId, JobState, JobStatus, OutputArtifact, SourceRef, PROGRESS_COMPLETE, PROGRESS_IDLE,
    PROGRESS_STARTED,
};
pub use orchestrator::{BatchOutcome, QueueOrchestrator, DEFAULT_MAX_JOBS};
pub use summary::{format_elapsed, BatchSummary, Controls, StatusLevel, StatusLine};
