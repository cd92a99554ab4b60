use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::AudioFormat;
use crate::queue::DEFAULT_MAX_JOBS;

pub const DEFAULT_RELEASE_FEED_URL: &str =
    "https://api.github.com/repos/BradAlmonte/file43/releases/latest";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where converted artifacts are written.
    #[serde(default = "default_output_directory")]
    pub output_directory: String,
    /// Explicit ffmpeg binary. When unset the binary is looked up on `PATH`.
    #[serde(default)]
    pub ffmpeg_path: Option<String>,
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
    #[serde(default)]
    pub fallback_format: AudioFormat,
    #[serde(default = "default_transcode_timeout")]
    pub transcode_timeout_secs: u64,
    #[serde(default = "default_release_feed_url")]
    pub release_feed_url: String,
}

impl Config {
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.output_directory)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_directory: default_output_directory(),
            ffmpeg_path: None,
            max_jobs: default_max_jobs(),
            fallback_format: AudioFormat::default(),
            transcode_timeout_secs: default_transcode_timeout(),
            release_feed_url: default_release_feed_url(),
        }
    }
}

fn default_output_directory() -> String {
    // Use platform-specific data directory from dirs crate
    dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .map(|p| p.join("file43").join("output"))
        .unwrap_or_else(|| std::env::temp_dir().join("file43").join("output"))
        .to_string_lossy()
        .to_string()
}

fn default_max_jobs() -> usize {
    DEFAULT_MAX_JOBS
}

fn default_transcode_timeout() -> u64 {
    3600
}

fn default_release_feed_url() -> String {
    DEFAULT_RELEASE_FEED_URL.to_string()
}
