//! Operation orchestrator: mode inference, preflight checks and dispatch.

use std::path::{Path, PathBuf};

use same_file::is_same_file;

use crate::archive::Placement;
use crate::codec::Format;
use crate::{compress, extract, ArchiverError};

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Compress(Format),
    Decompress(Format),
}

/// Options that shape an operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationOptions {
    /// Replace existing destinations.
    pub force: bool,
    /// Show the progress indicator.
    pub progress: bool,
    /// Compression level; `None` picks the format's default.
    pub level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Compressed(PathBuf),
    Decompressed(Placement),
}

/// Picks the mode from the two file names alone.
///
/// A compressed suffix on the destination means compress; otherwise a
/// compressed suffix on the source means decompress.
pub fn infer_mode(source: &Path, destination: &Path) -> Result<Mode, ArchiverError> {
    if let Some(format) = Format::from_path(destination) {
        return Ok(Mode::Compress(format));
    }
    if let Some(format) = Format::from_path(source) {
        return Ok(Mode::Decompress(format));
    }
    Err(ArchiverError::IndeterminateMode { input: source.to_path_buf(), output: destination.to_path_buf() })
}

/// Rejects the operation before any work is done.
///
/// An existing directory is always an acceptable decompression target. A
/// destination that is the source itself is refused even with `force`, since
/// writing it would destroy the input before it is read.
pub fn preflight(mode: Mode, source: &Path, destination: &Path, force: bool) -> Result<(), ArchiverError> {
    if !source.exists() {
        return Err(ArchiverError::SourceNotFound(source.to_path_buf()));
    }
    let occupied = destination.exists();
    let blocked = match mode {
        Mode::Compress(_) => occupied,
        Mode::Decompress(_) => occupied && !destination.is_dir(),
    };
    if blocked && !force {
        return Err(ArchiverError::DestinationExists(destination.to_path_buf()));
    }
    if occupied && is_same_file(source, destination).map_err(|e| ArchiverError::io(e, destination))? {
        return Err(ArchiverError::SameFile(destination.to_path_buf()));
    }
    Ok(())
}

/// Runs one compress or decompress operation end to end.
pub fn run(source: &Path, destination: &Path, options: &OperationOptions) -> Result<Outcome, ArchiverError> {
    let mode = infer_mode(source, destination)?;
    tracing::debug!(?mode, source = %source.display(), destination = %destination.display(), "inferred mode");
    preflight(mode, source, destination, options.force)?;

    match mode {
        Mode::Compress(format) => {
            compress::run(source, destination, format, options)?;
            Ok(Outcome::Compressed(destination.to_path_buf()))
        }
        Mode::Decompress(format) => extract::run(source, destination, format, options).map(Outcome::Decompressed),
    }
}
