use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::StorageError;

/// Maximum numbered variants tried before giving up on a name.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A converted file sitting in the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredArtifact {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Flat directory holding converted artifacts.
#[derive(Debug, Clone)]
pub struct OutputStore {
    output_directory: PathBuf,
}

impl OutputStore {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    /// Creates the output directory if needed.
    pub fn ensure_directory(&self) -> Result<(), StorageError> {
        if !self.output_directory.exists() {
            std::fs::create_dir_all(&self.output_directory).map_err(|e| {
                StorageError::CreateDirectory {
                    path: self.output_directory.clone(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }

    /// Atomically claims `{base}.{extension}`, or `{base}_2.{extension}`,
    /// `{base}_3.{extension}` and so on when taken. The claimed file is left
    /// empty for the caller to fill.
    pub fn reserve(&self, base: &str, extension: &str) -> Result<PathBuf, StorageError> {
        let base = sanitize_base(base);
        self.ensure_directory()?;

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let candidate = if counter == 1 {
                format!("{}.{}", base, extension)
            } else {
                format!("{}_{}.{}", base, counter, extension)
            };
            let path = self.output_directory.join(&candidate);

            // create_new fails if the file exists (O_CREAT | O_EXCL)
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => {
                    log::debug!("Reserved output {}", path.display());
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile { path, source: e });
                }
            }
        }

        Err(StorageError::FileExists(
            self.output_directory
                .join(format!("{}.{}", base, extension)),
        ))
    }

    /// Deletes a reserved or partially written artifact. Missing files are ignored.
    pub fn discard(&self, path: &Path) {
        match std::fs::remove_file(path) {
            Ok(()) => log::debug!("Discarded output {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to discard output {}: {}", path.display(), e),
        }
    }

    /// Stored artifacts sorted by name. A missing directory lists as empty.
    pub fn list(&self) -> Result<Vec<StoredArtifact>, StorageError> {
        let entries = match std::fs::read_dir(&self.output_directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::ReadDirectory {
                    path: self.output_directory.clone(),
                    source: e,
                })
            }
        };

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::ReadDirectory {
                path: self.output_directory.clone(),
                source: e,
            })?;
            let metadata = match entry.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            artifacts.push(StoredArtifact {
                name,
                path: entry.path(),
                size: metadata.len(),
            });
        }

        artifacts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(artifacts)
    }

    /// Maps an artifact name to its path, or `None` when no such file exists.
    ///
    /// Names that would escape the output directory are rejected.
    pub fn resolve(&self, name: &str) -> Result<Option<PathBuf>, StorageError> {
        if name.is_empty()
            || name == "."
            || name.contains("..")
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let path = self.output_directory.join(name);
        Ok(path.is_file().then_some(path))
    }
}

/// Replaces path separators so a base name stays a single path component.
fn sanitize_base(base: &str) -> String {
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "output".to_string()
    } else {
        trimmed.to_string()
    }
}
