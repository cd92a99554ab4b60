//! Transcoder backed by an external `ffmpeg` binary.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use tokio::process::Command;

use crate::config::Config;
use crate::error::TranscodeError;
use crate::format::{supported_input_extension, AudioFormat};
use crate::logging::redact_path;
use crate::queue::OutputArtifact;
use crate::storage::OutputStore;

use super::{TranscodeRequest, Transcoder};

/// Default per-job timeout: one hour.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);

const ENGINE_NAME: &str = "ffmpeg";

/// Runs one ffmpeg process per request and writes into an [`OutputStore`].
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    store: OutputStore,
    ffmpeg_path: Option<PathBuf>,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(store: OutputStore) -> Self {
        Self {
            store,
            ffmpeg_path: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut transcoder = Self::new(OutputStore::new(config.output_path()))
            .with_timeout(config.transcode_timeout());
        transcoder.ffmpeg_path = config.ffmpeg_path.as_ref().map(PathBuf::from);
        transcoder
    }

    /// Prefer this binary over a `PATH` lookup when it exists.
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Locates the engine: the configured path if it exists, else `PATH`.
    pub fn resolve_binary(&self) -> Result<PathBuf, TranscodeError> {
        if let Some(path) = &self.ffmpeg_path {
            if path.exists() {
                return Ok(path.clone());
            }
            tracing::warn!(
                configured = %path.display(),
                "Configured ffmpeg not found, falling back to PATH"
            );
        }
        which::which(ENGINE_NAME).map_err(|e| TranscodeError::EngineUnavailable(e.to_string()))
    }

    async fn run(
        &self,
        binary: &Path,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<(), TranscodeError> {
        let mut cmd = Command::new(binary);
        cmd.args(build_args(input, output, format))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(TranscodeError::Spawn)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TranscodeError::Spawn(e)),
            Err(_) => return Err(TranscodeError::TimedOut(self.timeout)),
        };

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(TranscodeError::Failed {
            status: output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string()),
            detail: last_meaningful_line(&stderr)
                .unwrap_or("no diagnostic output")
                .to_string(),
        })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, request: TranscodeRequest) -> Result<OutputArtifact, TranscodeError> {
        let input = &request.source.path;
        if supported_input_extension(Path::new(&request.source.name)).is_none() {
            return Err(TranscodeError::UnsupportedInput(request.source.name.clone()));
        }
        if !input.is_file() {
            return Err(TranscodeError::SourceMissing(input.clone()));
        }

        let binary = self.resolve_binary()?;

        let today = Local::now().date_naive();
        let base = request
            .naming
            .apply(request.source.base_name(), request.ordinal, today);
        let reserved = ReservedOutput::new(
            &self.store,
            self.store.reserve(&base, request.format.extension())?,
        );

        tracing::debug!(
            input = %redact_path(input),
            output = %redact_path(reserved.path()),
            codec = request.format.codec(),
            "Running ffmpeg"
        );

        self.run(&binary, input, reserved.path(), request.format).await?;
        let output_path = reserved.keep();

        let name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", base, request.format.extension()));

        Ok(OutputArtifact {
            name,
            locator: output_path.to_string_lossy().into_owned(),
        })
    }
}

/// A claimed output file that is discarded unless kept.
///
/// Covers both a failed run and a dropped transcode future.
struct ReservedOutput<'a> {
    store: &'a OutputStore,
    path: PathBuf,
    kept: bool,
}

impl<'a> ReservedOutput<'a> {
    fn new(store: &'a OutputStore, path: PathBuf) -> Self {
        Self {
            store,
            path,
            kept: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn keep(mut self) -> PathBuf {
        self.kept = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ReservedOutput<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.store.discard(&self.path);
        }
    }
}

/// Arguments for one audio extraction.
pub fn build_args(input: &Path, output: &Path, format: AudioFormat) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        "-vn".to_string(),
        "-c:a".to_string(),
        format.codec().to_string(),
        "-f".to_string(),
        format.muxer().to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

fn last_meaningful_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingPattern;
    use crate::queue::SourceRef;
    use tempfile::TempDir;

    fn request(path: PathBuf, format: AudioFormat) -> TranscodeRequest {
        TranscodeRequest {
            source: SourceRef::from_path(path),
            format,
            naming: NamingPattern::Original,
            ordinal: 1,
        }
    }

    #[test]
    fn test_build_args() {
        let args = build_args(Path::new("/in/a.mkv"), Path::new("/out/a.m4a"), AudioFormat::M4a);
        assert_eq!(
            args,
            vec![
                "-hide_banner", "-nostdin", "-y", "-i", "/in/a.mkv", "-vn", "-c:a", "aac", "-f",
                "ipod", "/out/a.m4a"
            ]
        );
    }

    #[test]
    fn test_last_meaningful_line() {
        assert_eq!(
            last_meaningful_line("ffmpeg version x\n  Invalid data found  \n\n"),
            Some("Invalid data found")
        );
        assert_eq!(last_meaningful_line("  \n"), None);
    }

    #[test]
    fn test_configured_binary_is_preferred() {
        let temp = TempDir::new().unwrap();
        let fake = temp.path().join("ffmpeg-custom");
        std::fs::write(&fake, b"").unwrap();
        let transcoder =
            FfmpegTranscoder::new(OutputStore::new(temp.path())).with_ffmpeg_path(&fake);
        assert_eq!(transcoder.resolve_binary().unwrap(), fake);
    }

    #[tokio::test]
    async fn test_unsupported_input_rejected() {
        let temp = TempDir::new().unwrap();
        let transcoder = FfmpegTranscoder::new(OutputStore::new(temp.path().join("out")));
        let result = transcoder
            .transcode(request(temp.path().join("notes.txt"), AudioFormat::Mp3))
            .await;
        assert!(matches!(result, Err(TranscodeError::UnsupportedInput(_))));
    }

    #[tokio::test]
    async fn test_missing_source_rejected() {
        let temp = TempDir::new().unwrap();
        let transcoder = FfmpegTranscoder::new(OutputStore::new(temp.path().join("out")));
        let result = transcoder
            .transcode(request(temp.path().join("gone.mp4"), AudioFormat::Mp3))
            .await;
        assert!(matches!(result, Err(TranscodeError::SourceMissing(_))));
        assert!(!temp.path().join("out").join("gone.mp3").exists());
    }

    #[test]
    fn test_reserved_output_discarded_unless_kept() {
        let temp = TempDir::new().unwrap();
        let store = OutputStore::new(temp.path());

        let dropped = ReservedOutput::new(&store, store.reserve("clip", "mp3").unwrap());
        let dropped_path = dropped.path().to_path_buf();
        drop(dropped);
        assert!(!dropped_path.exists());

        let kept = ReservedOutput::new(&store, store.reserve("clip", "mp3").unwrap()).keep();
        assert!(kept.exists());
        assert_eq!(kept, temp.path().join("clip.mp3"));
    }

    #[cfg(unix)]
    fn fake_engine(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_run_produces_artifact() {
        let temp = TempDir::new().unwrap();
        let engine = fake_engine(
            temp.path(),
            "#!/bin/sh\nfor last; do :; done\nprintf 'audio' > \"$last\"\n",
        );
        let input = temp.path().join("clip.mp4");
        std::fs::write(&input, b"video").unwrap();
        let transcoder = FfmpegTranscoder::new(OutputStore::new(temp.path().join("out")))
            .with_ffmpeg_path(engine);

        let mut req = request(input, AudioFormat::Flac);
        req.naming = NamingPattern::SuffixConverted;
        let artifact = transcoder.transcode(req).await.unwrap();

        assert_eq!(artifact.name, "clip_converted.flac");
        assert_eq!(std::fs::read(&artifact.locator).unwrap(), b"audio");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_run_reports_stderr_and_discards_output() {
        let temp = TempDir::new().unwrap();
        let engine = fake_engine(
            temp.path(),
            "#!/bin/sh\necho 'ffmpeg banner' >&2\necho 'clip.mp4: Invalid data found when processing input' >&2\nexit 1\n",
        );
        let input = temp.path().join("clip.mp4");
        std::fs::write(&input, b"video").unwrap();
        let transcoder = FfmpegTranscoder::new(OutputStore::new(temp.path().join("out")))
            .with_ffmpeg_path(engine);

        let err = transcoder
            .transcode(request(input, AudioFormat::Mp3))
            .await
            .unwrap_err();

        match err {
            TranscodeError::Failed { status, detail } => {
                assert_eq!(status, "1");
                assert_eq!(detail, "clip.mp4: Invalid data found when processing input");
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
        assert!(!temp.path().join("out").join("clip.mp3").exists());
    }
}
