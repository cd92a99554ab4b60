//! Job entity and its state machine.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::format::AudioFormat;

/// Progress marker before dispatch and after a failure.
pub const PROGRESS_IDLE: u8 = 0;
/// Progress marker while the engine is running.
pub const PROGRESS_STARTED: u8 = 15;
/// Progress marker once the artifact exists.
pub const PROGRESS_COMPLETE: u8 = 100;

/// Opaque job identifier, unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Handle to the input file. The queue never touches the file itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub path: PathBuf,
    /// Display name, usually the file name.
    pub name: String,
}

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Builds a source reference named after the path's file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { path, name }
    }

    /// File name without its final extension.
    pub fn base_name(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.name)
    }
}

/// Reference to a produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputArtifact {
    /// File name inside the output store.
    pub name: String,
    /// Where the artifact can be fetched from (a path for the local store).
    pub locator: String,
}

/// Plain lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Converting,
    Done,
    Error,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Converting => write!(f, "Converting"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Error => write!(f, "Error"),
        }
    }
}

/// Lifecycle state with its payload. Output and error detail cannot coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    Queued,
    Converting,
    Done { output: OutputArtifact },
    Error { detail: String },
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued => JobStatus::Queued,
            JobState::Converting => JobStatus::Converting,
            JobState::Done { .. } => JobStatus::Done,
            JobState::Error { .. } => JobStatus::Error,
        }
    }
}

/// One file's conversion request and its tracked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: JobId,
    pub ordinal: u64,
    pub source: SourceRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_format: Option<String>,
    /// Format resolved at the most recent dispatch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_format: Option<AudioFormat>,
    pub progress: u8,
    #[serde(flatten)]
    pub state: JobState,
}

impl Job {
    pub fn new(ordinal: u64, source: SourceRef) -> Self {
        Self {
            id: JobId::new(),
            ordinal,
            source,
            requested_format: None,
            target_format: None,
            progress: PROGRESS_IDLE,
            state: JobState::Queued,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, JobState::Done { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, JobState::Error { .. })
    }

    pub fn is_converting(&self) -> bool {
        matches!(self.state, JobState::Converting)
    }

    pub fn output(&self) -> Option<&OutputArtifact> {
        match &self.state {
            JobState::Done { output } => Some(output),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        match &self.state {
            JobState::Error { detail } => Some(detail),
            _ => None,
        }
    }

    /// Row label shown next to the job.
    pub fn status_label(&self) -> String {
        match (&self.state, self.target_format) {
            (JobState::Queued, _) => "Queued".to_string(),
            (JobState::Converting, Some(format)) => {
                format!("Converting to {}...", format.extension().to_ascii_uppercase())
            }
            (JobState::Converting, None) => "Converting...".to_string(),
            (JobState::Done { .. }, _) => "Done".to_string(),
            (JobState::Error { .. }, _) => "Error - click Retry".to_string(),
        }
    }

    pub(crate) fn begin_conversion(&mut self, format: AudioFormat) {
        self.target_format = Some(format);
        self.state = JobState::Converting;
        self.progress = PROGRESS_STARTED;
    }

    pub(crate) fn complete(&mut self, output: OutputArtifact) {
        self.state = JobState::Done { output };
        self.progress = PROGRESS_COMPLETE;
    }

    pub(crate) fn fail(&mut self, detail: impl Into<String>) {
        self.state = JobState::Error {
            detail: detail.into(),
        };
        self.progress = PROGRESS_IDLE;
    }

    pub(crate) fn requeue(&mut self) {
        self.state = JobState::Queued;
        self.progress = PROGRESS_IDLE;
    }
}
