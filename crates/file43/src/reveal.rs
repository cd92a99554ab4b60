//! Opens the output folder in the platform file manager.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::RevealError;

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(target_os = "windows")]
const OPENER: &str = "explorer";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENER: &str = "xdg-open";

/// Name of the program used to reveal folders on this platform.
pub fn opener() -> &'static str {
    OPENER
}

/// Best-effort reveal of `path`. The opener is spawned and left running.
pub fn reveal_directory(path: &Path) -> Result<(), RevealError> {
    if !path.is_dir() {
        return Err(RevealError::Missing(path.to_path_buf()));
    }

    Command::new(OPENER)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| RevealError::Launch {
            opener: OPENER,
            source: e,
        })?;

    log::info!("Opened output folder {}", path.display());
    Ok(())
}
