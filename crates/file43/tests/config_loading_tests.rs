//! Table-driven tests for configuration loading and validation.

mod common;

use file43::config::{load_config, load_config_from_str, Preferences, PreferencesStore, Theme};
use file43::{AudioFormat, QueueOrchestrator};

use common::{ScriptedTranscoder, TestHarness};

/// A single config loading test case.
struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Expected error substring when loading fails.
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "empty_object_uses_defaults",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "output_directory": "/srv/file43/out",
            "ffmpeg_path": "/opt/ffmpeg/bin/ffmpeg",
            "max_jobs": 50,
            "fallback_format": "wav",
            "transcode_timeout_secs": 120,
            "release_feed_url": "https://example.invalid/releases/latest"
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "zero_max_jobs",
        config_json: r#"{ "max_jobs": 0 }"#,
        should_succeed: false,
        expected_error: Some("max_jobs"),
    },
    ConfigTestCase {
        name: "zero_timeout",
        config_json: r#"{ "transcode_timeout_secs": 0 }"#,
        should_succeed: false,
        expected_error: Some("transcode_timeout_secs"),
    },
    ConfigTestCase {
        name: "blank_output_directory",
        config_json: r#"{ "output_directory": "   " }"#,
        should_succeed: false,
        expected_error: Some("output_directory"),
    },
    ConfigTestCase {
        name: "unknown_fallback_format",
        config_json: r#"{ "fallback_format": "xyz" }"#,
        should_succeed: false,
        expected_error: Some("parse"),
    },
    ConfigTestCase {
        name: "malformed_json",
        config_json: r#"{ "max_jobs": "#,
        should_succeed: false,
        expected_error: Some("parse"),
    },
];

#[test]
fn test_json_config_table() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("{}: expected success, got error: {}", case.name, e),
            (false, Ok(_)) => panic!("{}: expected failure, got success", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    let message = e.to_string();
                    assert!(
                        message.contains(expected),
                        "{}: error '{}' does not mention '{}'",
                        case.name,
                        message,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_load_config_from_file() {
    let harness = TestHarness::new();
    let path = harness.temp_path().join("file43.json");
    std::fs::write(
        &path,
        r#"{ "output_directory": "/tmp/out", "max_jobs": 3, "fallback_format": "ogg" }"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();

    assert_eq!(config.output_directory, "/tmp/out");
    assert_eq!(config.max_jobs, 3);
    assert_eq!(config.fallback_format, AudioFormat::Ogg);
}

#[test]
fn test_missing_config_file_reports_path() {
    let harness = TestHarness::new();
    let path = harness.temp_path().join("absent.json");

    let err = load_config(&path).unwrap_err();

    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_config_capacity_reaches_queue() {
    let harness = TestHarness::new();
    let config = load_config_from_str(r#"{ "max_jobs": 2, "fallback_format": "flac" }"#).unwrap();
    let queue = QueueOrchestrator::from_config(
        &config,
        std::sync::Arc::new(ScriptedTranscoder::new()),
    );

    let report = queue
        .admit(harness.sources(&["a.mp4", "b.mp4", "c.mp4"]))
        .unwrap();

    assert_eq!(queue.capacity(), 2);
    assert_eq!(report.admitted.len(), 2);
    assert_eq!(report.dropped_over_capacity, 1);
    assert_eq!(queue.default_format(), "flac");
}

#[test]
fn test_preferences_survive_restart() {
    let harness = TestHarness::new();
    let store = PreferencesStore::new(harness.temp_path().join("prefs").join("preferences.json"));
    assert_eq!(store.load(), Preferences::default());

    let prefs = Preferences {
        theme: Theme::Light,
        default_format: "m4a".to_string(),
        auto_open_output: true,
    };
    store.save(&prefs).unwrap();

    let reopened = PreferencesStore::new(store.path().to_path_buf());
    assert_eq!(reopened.load(), prefs);
}

#[test]
fn test_corrupt_preferences_fall_back_to_defaults() {
    let harness = TestHarness::new();
    let path = harness.temp_path().join("preferences.json");
    std::fs::write(&path, "{ not json").unwrap();

    let prefs = PreferencesStore::new(path).load();

    assert_eq!(prefs, Preferences::default());
}
