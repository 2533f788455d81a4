use std::path::PathBuf;

use crate::codec::Format;

/// The primary error type for all operations in the `bzst` crate.
#[derive(Debug, thiserror::Error)]
pub enum ArchiverError {
    /// Neither path carries a recognized compressed suffix.
    #[error("Cannot infer mode: either target must end with .bz2/.zst to compress, or source must end with .bz2/.zst to decompress (got '{}' -> '{}').", input.display(), output.display())]
    IndeterminateMode { input: PathBuf, output: PathBuf },

    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Target exists: {}. Use --force to overwrite.", .0.display())]
    DestinationExists(PathBuf),

    /// Source and destination name the same file; even `--force` cannot help.
    #[error("Source and target are the same file: {}", .0.display())]
    SameFile(PathBuf),

    /// The delegated codec's executable is not on the search path.
    #[error("{program} command not found in PATH. Cannot handle .{program} files without external {program}.")]
    DependencyMissing {
        program: &'static str,
        #[source]
        source: which::Error,
    },

    /// The delegated codec exited unsuccessfully. `code` is `None` when it was killed by a signal.
    #[error("{program} failed with exit code {}", code.map_or_else(|| "<signal>".to_string(), |c| c.to_string()))]
    ExternalCodecFailed { program: &'static str, code: Option<i32> },

    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", path.display())]
    Io { source: std::io::Error, path: PathBuf },

    /// The bz2 stream is malformed.
    #[error("corrupt bz2 data in '{}': {source}", path.display())]
    Bz2 { source: bzip2::Error, path: PathBuf },

    /// The compressed stream ended before its end-of-stream marker.
    #[error("compressed stream '{}' ended unexpectedly", path.display())]
    Truncated { path: PathBuf },

    /// Unpacking the container failed part-way. Already extracted entries stay on disk.
    #[error("failed to extract archive into '{}': {source}", destination.display())]
    Extraction { source: std::io::Error, destination: PathBuf },

    #[error("invalid compression level {level} for {format} (expected {min}..={max})")]
    InvalidLevel { format: Format, level: u32, min: u32, max: u32 },

    /// A wrapper for any other error that doesn't fit the specific variants.
    #[error("An unexpected error occurred: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl ArchiverError {
    pub(crate) fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ArchiverError::Io { source, path: path.into() }
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ArchiverError::SourceNotFound(_) => 2,
            ArchiverError::DestinationExists(_) => 3,
            ArchiverError::IndeterminateMode { .. } => 4,
            _ => 1,
        }
    }
}

// Generic IO error conversion that doesn't require a path
impl From<std::io::Error> for ArchiverError {
    fn from(err: std::io::Error) -> Self {
        ArchiverError::Io { source: err, path: PathBuf::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(ArchiverError::SourceNotFound("a".into()).exit_code(), 2);
        assert_eq!(ArchiverError::DestinationExists("a".into()).exit_code(), 3);
        let indeterminate = ArchiverError::IndeterminateMode { input: "a".into(), output: "b".into() };
        assert_eq!(indeterminate.exit_code(), 4);
        let failed = ArchiverError::ExternalCodecFailed { program: "zstd", code: Some(1) };
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(failed.to_string(), "zstd failed with exit code 1");
        assert_eq!(ArchiverError::Truncated { path: "x.bz2".into() }.exit_code(), 1);
        assert_eq!(ArchiverError::SameFile("a.bz2".into()).exit_code(), 1);
    }
}
