//! The transport boundary between the queue and the transcoding engine.

pub mod ffmpeg;

use async_trait::async_trait;

use crate::error::TranscodeError;
use crate::format::AudioFormat;
use crate::naming::NamingPattern;
use crate::queue::{OutputArtifact, SourceRef};

pub use ffmpeg::FfmpegTranscoder;

/// One conversion request for a single job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    pub source: SourceRef,
    pub format: AudioFormat,
    pub naming: NamingPattern,
    pub ordinal: u64,
}

/// Performs one conversion. Every failure is returned, never panicked.
///
/// The queue awaits at most one call at a time.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, request: TranscodeRequest) -> Result<OutputArtifact, TranscodeError>;
}
