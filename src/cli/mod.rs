use clap::Parser;
use std::path::PathBuf;

use crate::operation::OperationOptions;

/// Compress to .bz2 (built in) or .zst (requires the external `zstd`), or decompress either.
///
/// The mode is inferred from the file names: a DESTINATION ending in .bz2/.zst
/// means compress SOURCE into it; otherwise a SOURCE ending in .bz2/.zst means
/// decompress it to DESTINATION.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about)]
pub struct Args {
    /// Source file or directory (or archive to extract).
    pub source: PathBuf,

    /// Target file or directory.
    pub destination: PathBuf,

    /// Print the elapsed time of the operation.
    #[arg(short, long)]
    pub benchmark: bool,

    /// Show a progress indicator.
    #[arg(long, visible_alias = "spinner")]
    pub progress: bool,

    /// Overwrite destination files without prompting.
    #[arg(short, long)]
    pub force: bool,

    /// Compression level: 1-9 for bz2 (default 9), 1-19 for zstd (default: zstd's own).
    #[arg(short, long)]
    pub level: Option<u32>,

    /// Enable debug logging. `RUST_LOG` takes precedence when set.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn options(&self) -> OperationOptions {
        OperationOptions {
            force: self.force,
            progress: self.progress,
            level: self.level,
        }
    }
}

/// Parses command-line arguments using `clap`.
///
/// Errors are returned rather than printed so the caller decides how to exit.
pub fn run() -> Result<Args, clap::Error> {
    Args::try_parse()
}
