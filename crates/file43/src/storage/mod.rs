pub mod archive;
pub mod filesystem;

pub use archive::{create_archive, write_archive, ArchiveReport, ARCHIVE_FILE_NAME};
pub use filesystem::{OutputStore, StoredArtifact};
