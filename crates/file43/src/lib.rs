pub mod broadcast;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod naming;
pub mod queue;
pub mod reveal;
pub mod storage;
pub mod transcode;
pub mod update;

pub use broadcast::{QueueEvent, QueueEventBroadcaster, QueueEventKind};
pub use config::{load_config, Config, Preferences, PreferencesStore};
pub use error::{File43Error, QueueError, Result, StorageError, TranscodeError};
pub use format::{resolve_format, AudioFormat};
pub use naming::{name_for, NamingPattern};
pub use queue::{
    AdmissionReport, BatchOutcome, BatchSummary, Job, JobId, JobStatus, OutputArtifact,
    QueueOrchestrator, SourceRef,
};
pub use storage::OutputStore;
pub use transcode::{FfmpegTranscoder, TranscodeRequest, Transcoder};
