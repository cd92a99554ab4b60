//! Bundles stored artifacts into a single ZIP download.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveError;
use crate::storage::filesystem::OutputStore;

/// Default file name for a downloaded bundle.
pub const ARCHIVE_FILE_NAME: &str = "File43_downloads.zip";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveReport {
    pub included: Vec<String>,
    /// Requested names that were not in the store.
    pub skipped: Vec<String>,
}

/// Writes the named artifacts into a ZIP on `writer`. Names that do not
/// resolve to a stored file are skipped.
pub fn write_archive<W, S>(
    store: &OutputStore,
    names: &[S],
    writer: W,
) -> Result<(ArchiveReport, W), ArchiveError>
where
    W: Write + Seek,
    S: AsRef<str>,
{
    if names.is_empty() {
        return Err(ArchiveError::NoFiles);
    }

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut zip = ZipWriter::new(writer);
    let mut report = ArchiveReport::default();

    for name in names {
        let name = name.as_ref();
        let path = match store.resolve(name) {
            Ok(Some(path)) => path,
            Ok(None) => {
                log::debug!("Skipping missing artifact {}", name);
                report.skipped.push(name.to_string());
                continue;
            }
            Err(e) => {
                log::warn!("Skipping artifact: {}", e);
                report.skipped.push(name.to_string());
                continue;
            }
        };

        let mut file = File::open(&path).map_err(|e| ArchiveError::ReadArtifact {
            path: path.clone(),
            source: e,
        })?;
        zip.start_file(name, options)?;
        std::io::copy(&mut file, &mut zip).map_err(|e| ArchiveError::ReadArtifact {
            path: path.clone(),
            source: e,
        })?;
        report.included.push(name.to_string());
    }

    let writer = zip.finish()?;
    Ok((report, writer))
}

/// Writes the named artifacts to a ZIP file at `destination`.
///
/// When `destination` is a directory the archive is named
/// [`ARCHIVE_FILE_NAME`] inside it.
pub fn create_archive<S: AsRef<str>>(
    store: &OutputStore,
    names: &[S],
    destination: &Path,
) -> Result<(PathBuf, ArchiveReport), ArchiveError> {
    if names.is_empty() {
        return Err(ArchiveError::NoFiles);
    }

    let path = if destination.is_dir() {
        destination.join(ARCHIVE_FILE_NAME)
    } else {
        destination.to_path_buf()
    };

    let file = File::create(&path).map_err(|e| ArchiveError::CreateFile {
        path: path.clone(),
        source: e,
    })?;

    let (report, mut file) = write_archive(store, names, file)?;
    file.flush()?;

    log::info!(
        "Wrote {} ({} included, {} skipped)",
        path.display(),
        report.included.len(),
        report.skipped.len()
    );
    Ok((path, report))
}
