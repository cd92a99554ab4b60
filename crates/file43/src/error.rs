use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum File43Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Preferences error: {0}")]
    Preferences(#[from] PreferencesError),

    #[error("Reveal error: {0}")]
    Reveal(#[from] RevealError),

    #[error("Update check error: {0}")]
    Update(#[from] UpdateError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

/// Rejections raised by the queue orchestrator.
///
/// Every variant's message is meant to be shown to the operator as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("No supported files found in selection.")]
    NoSupportedFiles,

    #[error("Add at least one supported file first.")]
    EmptyQueue,

    #[error("Wait for the current conversion to finish before clearing.")]
    ClearWhileProcessing,

    #[error("Wait for the current conversion to finish before clearing completed files.")]
    ClearCompletedWhileProcessing,

    #[error("Can't remove a file while it's being converted.")]
    RemoveWhileConverting,

    #[error("Wait until the current conversion finishes, then retry.")]
    RetryWhileProcessing,

    #[error("Only failed files can be retried.")]
    RetryNotFailed,

    #[error("No job with id '{0}' in the queue.")]
    JobNotFound(String),
}

#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffmpeg not found: {0}")]
    EngineUnavailable(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedInput(String),

    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),

    #[error("Failed to spawn ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with status {status}: {detail}")]
    Failed { status: String, detail: String },

    #[error("ffmpeg timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Failed to prepare output: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read output directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid artifact name: {0}")]
    InvalidName(String),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("No files provided for ZIP.")]
    NoFiles,

    #[error("Failed to create archive '{path}': {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read artifact '{path}': {source}")]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Failed to create preferences directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preferences '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum RevealError {
    #[error("Output directory does not exist: {0}")]
    Missing(PathBuf),

    #[error("Failed to launch '{opener}': {source}")]
    Launch {
        opener: &'static str,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("Release feed request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Release feed returned HTTP {0}")]
    Status(u16),

    #[error("Could not determine latest version from the release feed")]
    UnknownVersion,
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

pub type Result<T> = std::result::Result<T, File43Error>;
