//! Supported input extensions, output formats and per-job format resolution.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Extensions accepted into the queue (video containers first, then audio).
pub const SUPPORTED_INPUT_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "avi", "webm", "mp3", "wav", "m4a", "flac", "ogg",
];

/// Audio formats the transcoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    Aac,
    Flac,
    Ogg,
    M4a,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 6] = [
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::Aac,
        AudioFormat::Flac,
        AudioFormat::Ogg,
        AudioFormat::M4a,
    ];

    /// Parses a format code, ignoring case and surrounding whitespace.
    /// Returns `None` for anything outside the supported output set.
    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "aac" => Some(AudioFormat::Aac),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            "m4a" => Some(AudioFormat::M4a),
            _ => None,
        }
    }

    /// File extension of the produced artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Aac => "aac",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "m4a",
        }
    }

    /// ffmpeg audio encoder for this format.
    pub fn codec(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "libmp3lame",
            AudioFormat::Wav => "pcm_s16le",
            AudioFormat::Aac | AudioFormat::M4a => "aac",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "libvorbis",
        }
    }

    /// ffmpeg muxer name for this format.
    pub fn muxer(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Aac => "adts",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
            AudioFormat::M4a => "ipod",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Returns the lowercased extension of `path` if it is an accepted input type.
pub fn supported_input_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_INPUT_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Picks the effective output format for a job at dispatch time.
///
/// Precedence: the job's own override, then the batch default, then the
/// configured fallback. Values outside the supported set are skipped.
pub fn resolve_format(
    requested: Option<&str>,
    batch_default: &str,
    fallback: AudioFormat,
) -> AudioFormat {
    requested
        .and_then(AudioFormat::parse)
        .or_else(|| AudioFormat::parse(batch_default))
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(AudioFormat::parse("FLAC"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::parse(" m4a "), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::parse("xyz"), None);
        assert_eq!(AudioFormat::parse(""), None);
    }

    #[test]
    fn test_every_format_round_trips_through_its_extension() {
        for format in AudioFormat::ALL {
            assert_eq!(AudioFormat::parse(format.extension()), Some(format));
        }
    }

    #[test]
    fn test_supported_input_extension() {
        assert_eq!(
            supported_input_extension(&PathBuf::from("/in/Clip.MKV")),
            Some("mkv".to_string())
        );
        assert_eq!(
            supported_input_extension(&PathBuf::from("song.flac")),
            Some("flac".to_string())
        );
        assert_eq!(supported_input_extension(&PathBuf::from("notes.txt")), None);
        assert_eq!(supported_input_extension(&PathBuf::from("README")), None);
    }

    #[test]
    fn test_resolve_prefers_job_override() {
        let format = resolve_format(Some("wav"), "flac", AudioFormat::Mp3);
        assert_eq!(format, AudioFormat::Wav);
    }

    #[test]
    fn test_resolve_skips_invalid_override() {
        let format = resolve_format(Some("wma"), "ogg", AudioFormat::Mp3);
        assert_eq!(format, AudioFormat::Ogg);
    }

    #[test]
    fn test_resolve_invalid_batch_default_uses_fallback() {
        let format = resolve_format(None, "xyz", AudioFormat::Mp3);
        assert_eq!(format, AudioFormat::Mp3);
    }

    #[test]
    fn test_resolve_uses_configured_fallback() {
        let format = resolve_format(None, "", AudioFormat::Flac);
        assert_eq!(format, AudioFormat::Flac);
    }
}
