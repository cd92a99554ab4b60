//! The conversion queue orchestrator.
//!
//! Owns the ordered job collection and the processing flag, and drives
//! sequential dispatch against a single [`Transcoder`]. Every operation takes
//! `&self` so one instance can be shared behind an `Arc` between the driver
//! of a batch and whatever UI layer mutates the queue meanwhile.
//!
//! The state lock is never held across an `.await`: a dispatch step locks to
//! mark the job `Converting`, releases the lock while the engine runs, then
//! locks again to apply the result.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::broadcast::{QueueEvent, QueueEventBroadcaster, QueueEventKind};
use crate::config::Config;
use crate::error::QueueError;
use crate::format::{resolve_format, AudioFormat};
use crate::logging::redact_path;
use crate::naming::NamingPattern;
use crate::transcode::{TranscodeRequest, Transcoder};

use super::admission::{capacity_message, queued_message, AdmissionPlan, AdmissionReport};
use super::job::{Job, JobId, JobStatus, OutputArtifact, SourceRef};
use super::summary::{BatchSummary, Controls, StatusLine};

/// Default capacity ceiling.
pub const DEFAULT_MAX_JOBS: usize = 20;

const RUN_STARTED: &str = "Converting files one by one…";
const RUN_FINISHED_CLEAN: &str = "All files processed. You can download individually or as ZIP.";
const RUN_FINISHED_WITH_ERRORS: &str = "Finished with some errors. You can retry failed files.";
const JOB_FAILED: &str = "Some files failed. You can retry individual files that show an error.";
const RETRY_FINISHED_CLEAN: &str = "Retry finished. All files processed successfully.";
const RETRY_FINISHED_WITH_ERRORS: &str =
    "Finished retry with some errors. You can retry again if needed.";
const QUEUE_CLEARED: &str = "Queue cleared.";
const COMPLETED_CLEARED: &str = "Completed files cleared from queue.";
const JOB_REMOVED: &str = "File removed from queue.";
const INTERRUPTED: &str = "Conversion interrupted";

/// How a call to [`QueueOrchestrator::run_all`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    AllSucceeded,
    CompletedWithErrors,
    /// Another run was already in progress; nothing was done.
    AlreadyRunning,
}

struct QueueState {
    jobs: Vec<Job>,
    next_ordinal: u64,
    processing: bool,
    active_job: Option<JobId>,
    batch_started_at: Option<DateTime<Utc>>,
    /// Set when a run ends; elapsed time stops counting there.
    batch_finished_at: Option<DateTime<Utc>>,
    default_format: String,
    naming_pattern: NamingPattern,
    status: StatusLine,
}

impl QueueState {
    fn new(default_format: String) -> Self {
        Self {
            jobs: Vec::new(),
            next_ordinal: 1,
            processing: false,
            active_job: None,
            batch_started_at: None,
            batch_finished_at: None,
            default_format,
            naming_pattern: NamingPattern::Original,
            status: StatusLine::default(),
        }
    }

    fn position(&self, id: &JobId) -> Option<usize> {
        self.jobs.iter().position(|j| &j.id == id)
    }

    fn find_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| &j.id == id)
    }

    fn any_failed(&self) -> bool {
        self.jobs.iter().any(|j| j.is_failed())
    }

    fn summary(&self) -> BatchSummary {
        let until = self.batch_finished_at.unwrap_or_else(Utc::now);
        BatchSummary::compute(&self.jobs, self.batch_started_at, until)
    }

    fn controls(&self) -> Controls {
        Controls::compute(&self.jobs, self.processing)
    }
}

/// Sequential conversion queue.
pub struct QueueOrchestrator {
    state: Mutex<QueueState>,
    transcoder: Arc<dyn Transcoder>,
    events: QueueEventBroadcaster,
    capacity: usize,
    fallback_format: AudioFormat,
}

impl QueueOrchestrator {
    pub fn new(transcoder: Arc<dyn Transcoder>) -> Self {
        let fallback_format = AudioFormat::default();
        Self {
            state: Mutex::new(QueueState::new(fallback_format.to_string())),
            transcoder,
            events: QueueEventBroadcaster::default(),
            capacity: DEFAULT_MAX_JOBS,
            fallback_format,
        }
    }

    /// Builds an orchestrator using the capacity and fallback format from `config`.
    pub fn from_config(config: &Config, transcoder: Arc<dyn Transcoder>) -> Self {
        Self::new(transcoder)
            .with_capacity(config.max_jobs)
            .with_fallback_format(config.fallback_format)
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the last-resort format. The batch default starts out equal to it.
    pub fn with_fallback_format(mut self, format: AudioFormat) -> Self {
        self.fallback_format = format;
        self.lock().default_format = format.to_string();
        self
    }

    pub fn with_broadcaster(mut self, events: QueueEventBroadcaster) -> Self {
        self.events = events;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Queue state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn emit(&self, state: &QueueState, kind: QueueEventKind) {
        self.events.send(QueueEvent::new(
            kind,
            state.summary(),
            state.controls(),
            state.status.clone(),
        ));
    }

    fn reject(&self, state: &mut QueueState, error: QueueError) -> QueueError {
        debug!(reason = %error, "Queue operation rejected");
        state.status = StatusLine::error(error.to_string());
        self.emit(
            state,
            QueueEventKind::Rejected {
                reason: error.to_string(),
            },
        );
        error
    }

    // ─── Admission ──────────────────────────────────────────────────────────

    /// Adds candidate files to the end of the queue.
    ///
    /// Unsupported files are dropped. Supported files beyond the remaining
    /// capacity are dropped in submission order. Fails only when no candidate
    /// has a supported extension.
    pub fn admit<I>(&self, candidates: I) -> Result<AdmissionReport, QueueError>
    where
        I: IntoIterator<Item = SourceRef>,
    {
        let mut state = self.lock();
        let plan = AdmissionPlan::build(candidates, state.jobs.len(), self.capacity);

        if plan.nothing_supported() {
            return Err(self.reject(&mut state, QueueError::NoSupportedFiles));
        }

        let mut added = Vec::with_capacity(plan.accepted.len());
        for source in plan.accepted {
            let job = Job::new(state.next_ordinal, source);
            state.next_ordinal += 1;
            added.push(job.clone());
            state.jobs.push(job);
        }

        state.status = if plan.dropped_over_capacity > 0 {
            StatusLine::error(capacity_message(plan.remaining_slots, self.capacity))
        } else {
            StatusLine::info(queued_message(state.jobs.len()))
        };

        info!(
            admitted = added.len(),
            dropped_unsupported = plan.dropped_unsupported,
            dropped_over_capacity = plan.dropped_over_capacity,
            queue_len = state.jobs.len(),
            "Files admitted"
        );

        let report = AdmissionReport {
            admitted: added.iter().map(|j| j.id.clone()).collect(),
            dropped_unsupported: plan.dropped_unsupported,
            dropped_over_capacity: plan.dropped_over_capacity,
        };
        self.emit(&state, QueueEventKind::JobsAdded { jobs: added });
        Ok(report)
    }

    // ─── Execution ──────────────────────────────────────────────────────────

    /// Converts every job that is not yet `Done`, one at a time, in queue order.
    ///
    /// Returns [`BatchOutcome::AlreadyRunning`] without doing anything when a
    /// run or retry is in progress. Jobs admitted during the run are picked up;
    /// jobs removed before their turn are skipped.
    pub async fn run_all(&self) -> Result<BatchOutcome, QueueError> {
        let naming = {
            let mut state = self.lock();
            if state.processing {
                debug!("run_all ignored, queue already processing");
                return Ok(BatchOutcome::AlreadyRunning);
            }
            if state.jobs.is_empty() {
                return Err(self.reject(&mut state, QueueError::EmptyQueue));
            }
            state.processing = true;
            state.batch_started_at = Some(Utc::now());
            state.batch_finished_at = None;
            state.status = StatusLine::info(RUN_STARTED);
            info!(jobs = state.jobs.len(), "Batch started");
            self.emit(&state, QueueEventKind::BatchStarted);
            state.naming_pattern
        };

        let guard = ProcessingGuard::new(self);
        let mut visited: HashSet<JobId> = HashSet::new();

        loop {
            let next = {
                let mut state = self.lock();
                let index = state
                    .jobs
                    .iter()
                    .position(|j| !j.is_done() && !visited.contains(&j.id));
                index.map(|index| self.begin_dispatch(&mut state, index, naming))
            };
            let Some((id, request)) = next else {
                break;
            };
            visited.insert(id.clone());
            self.complete_dispatch(&id, request).await;
        }

        guard.disarm();

        let mut state = self.lock();
        state.processing = false;
        state.active_job = None;
        state.batch_finished_at = Some(Utc::now());
        let outcome = if state.any_failed() {
            state.status = StatusLine::error(RUN_FINISHED_WITH_ERRORS);
            BatchOutcome::CompletedWithErrors
        } else {
            state.status = StatusLine::success(RUN_FINISHED_CLEAN);
            BatchOutcome::AllSucceeded
        };
        let summary = state.summary();
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            elapsed = %summary.elapsed_display(),
            "Batch finished"
        );
        self.emit(&state, QueueEventKind::BatchFinished { outcome });
        Ok(outcome)
    }

    /// Re-runs a single failed job without touching any other job.
    ///
    /// Returns the job's status after the attempt.
    pub async fn retry(&self, id: &JobId) -> Result<JobStatus, QueueError> {
        let request = {
            let mut state = self.lock();
            if state.processing {
                return Err(self.reject(&mut state, QueueError::RetryWhileProcessing));
            }
            let Some(index) = state.position(id) else {
                return Err(self.reject(&mut state, QueueError::JobNotFound(id.to_string())));
            };
            if !state.jobs[index].is_failed() {
                return Err(self.reject(&mut state, QueueError::RetryNotFailed));
            }

            state.jobs[index].requeue();
            state.processing = true;
            let snapshot = state.jobs[index].clone();
            self.emit(&state, QueueEventKind::JobUpdated { job: snapshot });

            let naming = state.naming_pattern;
            let (_, request) = self.begin_dispatch(&mut state, index, naming);
            request
        };

        let guard = ProcessingGuard::new(self);
        let status = self.complete_dispatch(id, request).await;
        guard.disarm();

        let mut state = self.lock();
        state.processing = false;
        state.active_job = None;
        state.status = if state.any_failed() {
            StatusLine::error(RETRY_FINISHED_WITH_ERRORS)
        } else {
            StatusLine::success(RETRY_FINISHED_CLEAN)
        };
        let status = status.unwrap_or(JobStatus::Error);
        self.emit(
            &state,
            QueueEventKind::RetryFinished {
                job_id: id.clone(),
                status,
            },
        );
        Ok(status)
    }

    /// Marks the job at `index` as converting and builds its request.
    fn begin_dispatch(
        &self,
        state: &mut QueueState,
        index: usize,
        naming: NamingPattern,
    ) -> (JobId, TranscodeRequest) {
        let default_format = state.default_format.clone();
        let job = &mut state.jobs[index];
        let format = resolve_format(
            job.requested_format.as_deref(),
            &default_format,
            self.fallback_format,
        );
        job.begin_conversion(format);

        let request = TranscodeRequest {
            source: job.source.clone(),
            format,
            naming,
            ordinal: job.ordinal,
        };
        let id = job.id.clone();
        let snapshot = job.clone();

        state.active_job = Some(id.clone());
        self.emit(state, QueueEventKind::JobUpdated { job: snapshot });
        (id, request)
    }

    /// Awaits the engine and applies the result. Returns `None` if the job
    /// vanished meanwhile.
    async fn complete_dispatch(&self, id: &JobId, request: TranscodeRequest) -> Option<JobStatus> {
        let span = info_span!(
            "dispatch",
            job_id = %id,
            ordinal = request.ordinal,
            format = %request.format,
            filename = %redact_path(&request.source.path),
        );

        let result = self
            .transcoder
            .transcode(request)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        let mut state = self.lock();
        let Some(job) = state.find_mut(id) else {
            warn!("Job disappeared while converting");
            return None;
        };

        match result {
            Ok(output) => {
                info!(output = %output.name, "Conversion finished");
                job.complete(output);
            }
            Err(e) => {
                warn!(error = %e, "Conversion failed");
                job.fail(e.to_string());
            }
        }

        let snapshot = job.clone();
        if snapshot.is_failed() {
            state.status = StatusLine::error(JOB_FAILED);
        }
        self.emit(&state, QueueEventKind::JobUpdated { job: snapshot.clone() });
        Some(snapshot.status())
    }

    // ─── Mutation ───────────────────────────────────────────────────────────

    /// Removes every job and resets batch timing. Ordinals keep counting up.
    pub fn clear_all(&self) -> Result<(), QueueError> {
        let mut state = self.lock();
        if state.processing {
            return Err(self.reject(&mut state, QueueError::ClearWhileProcessing));
        }
        state.jobs.clear();
        state.batch_started_at = None;
        state.batch_finished_at = None;
        state.status = StatusLine::info(QUEUE_CLEARED);
        info!("Queue cleared");
        self.emit(&state, QueueEventKind::QueueCleared);
        Ok(())
    }

    /// Removes `Done` jobs, keeping the rest in order. Returns how many were removed.
    pub fn clear_completed(&self) -> Result<usize, QueueError> {
        let mut state = self.lock();
        if state.processing {
            return Err(self.reject(&mut state, QueueError::ClearCompletedWhileProcessing));
        }
        let before = state.jobs.len();
        state.jobs.retain(|j| !j.is_done());
        let removed = before - state.jobs.len();
        state.status = StatusLine::info(COMPLETED_CLEARED);
        info!(removed, "Completed jobs cleared");
        self.emit(&state, QueueEventKind::CompletedCleared { removed });
        Ok(removed)
    }

    /// Removes one job unless it is the one currently converting.
    pub fn remove(&self, id: &JobId) -> Result<Job, QueueError> {
        let mut state = self.lock();
        let Some(index) = state.position(id) else {
            return Err(self.reject(&mut state, QueueError::JobNotFound(id.to_string())));
        };
        if state.jobs[index].is_converting() {
            return Err(self.reject(&mut state, QueueError::RemoveWhileConverting));
        }
        let job = state.jobs.remove(index);
        state.status = StatusLine::info(JOB_REMOVED);
        debug!(job_id = %id, "Job removed");
        self.emit(&state, QueueEventKind::JobRemoved { job_id: id.clone() });
        Ok(job)
    }

    /// Sets or clears a job's own output format. Takes effect at its next dispatch.
    pub fn set_job_format(&self, id: &JobId, format: Option<&str>) -> Result<(), QueueError> {
        let mut state = self.lock();
        let Some(index) = state.position(id) else {
            return Err(self.reject(&mut state, QueueError::JobNotFound(id.to_string())));
        };
        let job = &mut state.jobs[index];
        job.requested_format = format.map(|f| f.trim().to_ascii_lowercase());
        let snapshot = job.clone();
        self.emit(&state, QueueEventKind::JobUpdated { job: snapshot });
        Ok(())
    }

    /// Sets the batch default format. Values outside the supported set are
    /// stored as given and resolve to the fallback at dispatch.
    pub fn set_default_format(&self, format: &str) {
        let mut state = self.lock();
        state.default_format = format.trim().to_ascii_lowercase();
        self.emit(&state, QueueEventKind::SettingsChanged);
    }

    /// Sets the naming pattern used by the next run or retry.
    pub fn set_naming_pattern(&self, pattern: NamingPattern) {
        let mut state = self.lock();
        state.naming_pattern = pattern;
        self.emit(&state, QueueEventKind::SettingsChanged);
    }

    // ─── Views ──────────────────────────────────────────────────────────────

    pub fn jobs(&self) -> Vec<Job> {
        self.lock().jobs.clone()
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.lock().jobs.iter().find(|j| &j.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }

    pub fn active_job(&self) -> Option<JobId> {
        self.lock().active_job.clone()
    }

    pub fn default_format(&self) -> String {
        self.lock().default_format.clone()
    }

    pub fn naming_pattern(&self) -> NamingPattern {
        self.lock().naming_pattern
    }

    pub fn summary(&self) -> BatchSummary {
        self.lock().summary()
    }

    pub fn controls(&self) -> Controls {
        self.lock().controls()
    }

    pub fn status_line(&self) -> StatusLine {
        self.lock().status.clone()
    }

    /// Artifacts of every `Done` job, in queue order.
    pub fn completed_outputs(&self) -> Vec<OutputArtifact> {
        self.lock()
            .jobs
            .iter()
            .filter_map(|j| j.output().cloned())
            .collect()
    }
}

/// Restores the processing flag if a run or retry future is dropped mid-flight.
struct ProcessingGuard<'a> {
    orchestrator: &'a QueueOrchestrator,
    armed: bool,
}

impl<'a> ProcessingGuard<'a> {
    fn new(orchestrator: &'a QueueOrchestrator) -> Self {
        Self {
            orchestrator,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.orchestrator.lock();
        warn!("Queue processing abandoned, restoring idle state");
        state.processing = false;
        state.active_job = None;
        if state.batch_started_at.is_some() && state.batch_finished_at.is_none() {
            state.batch_finished_at = Some(Utc::now());
        }

        let mut interrupted = Vec::new();
        for job in state.jobs.iter_mut().filter(|j| j.is_converting()) {
            job.fail(INTERRUPTED);
            interrupted.push(job.clone());
        }
        if !interrupted.is_empty() {
            state.status = StatusLine::error(JOB_FAILED);
        }
        for job in interrupted {
            self.orchestrator
                .emit(&state, QueueEventKind::JobUpdated { job });
        }
    }
}
