//! Test harness for isolated queue execution.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use file43::config::Config;
use file43::{QueueOrchestrator, SourceRef};

use super::transcoder::ScriptedTranscoder;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Where test media files are written.
    pub input_dir: PathBuf,
    /// Output directory handed to the config.
    pub output_dir: PathBuf,
    pub transcoder: Arc<ScriptedTranscoder>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_transcoder(ScriptedTranscoder::new())
    }

    pub fn with_transcoder(transcoder: ScriptedTranscoder) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        let output_dir = temp_dir.path().join("output");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");

        Self {
            temp_dir,
            input_dir,
            output_dir,
            transcoder: Arc::new(transcoder),
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self) -> Config {
        Config {
            output_directory: self.output_dir.to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    /// Builds a queue wired to the scripted transcoder.
    pub fn queue(&self) -> Arc<QueueOrchestrator> {
        Arc::new(QueueOrchestrator::from_config(
            &self.config(),
            self.transcoder.clone(),
        ))
    }

    /// Writes an empty media file and returns a reference to it.
    pub fn source(&self, filename: &str) -> SourceRef {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, b"media").expect("Failed to write input file");
        SourceRef::from_path(path)
    }

    pub fn sources(&self, filenames: &[&str]) -> Vec<SourceRef> {
        filenames.iter().map(|name| self.source(name)).collect()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
