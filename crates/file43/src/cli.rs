use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "file43")]
#[command(author, version, about = "Convert media files to audio, one at a time")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue files and convert them sequentially
    Convert {
        /// Media files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format (mp3, wav, aac, flac, ogg, m4a)
        #[arg(short, long)]
        format: Option<String>,

        /// Naming pattern (original, suffixConverted, dateSuffix, indexPrefix)
        #[arg(short, long, default_value = "original")]
        naming: String,
    },

    /// List converted files in the output directory
    List,

    /// Bundle converted files into a ZIP archive
    Zip {
        /// Archive path, or a directory to place File43_downloads.zip in
        dest: PathBuf,

        /// Artifact names to include (all when omitted)
        names: Vec<String>,
    },

    /// Check the release feed for a newer version
    CheckUpdate,
}
