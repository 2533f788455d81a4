//! # Transform Provider
//!
//! The closed set of supported compression formats and the codec that handles each:
//! - [`Format::Bz2`]: in-process, block-streamed through [`crate::block_pipeline`].
//! - [`Format::Zstd`]: delegated to the `zstd` executable, which must be on `PATH`.
//!
//! The two are not interchangeable; a missing `zstd` is an error, never a fallback.

pub mod bz2;
pub mod external;

use std::fmt;
use std::path::Path;

use crate::progress::ProgressReporter;
use crate::ArchiverError;
use external::ExternalCodec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bz2,
    Zstd,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Bz2, Format::Zstd];

    /// Filename suffix, including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Bz2 => ".bz2",
            Format::Zstd => ".zst",
        }
    }

    /// Matches the path's suffix case-insensitively.
    pub fn from_path(path: &Path) -> Option<Format> {
        let name = path.to_string_lossy().to_lowercase();
        Format::ALL.into_iter().find(|f| name.ends_with(f.extension()))
    }

    /// Accepted `--level` values.
    pub fn level_range(self) -> (u32, u32) {
        match self {
            Format::Bz2 => (1, 9),
            Format::Zstd => (1, 19),
        }
    }

    fn check_level(self, level: u32) -> Result<(), ArchiverError> {
        let (min, max) = self.level_range();
        if level < min || level > max {
            return Err(ArchiverError::InvalidLevel { format: self, level, min, max });
        }
        Ok(())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Bz2 => write!(f, "bz2"),
            Format::Zstd => write!(f, "zstd"),
        }
    }
}

/// How a codec call presents itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecContext {
    /// Draw progress: byte counters in-process, a spinner for external codecs.
    pub progress: bool,
    /// The compression target may be replaced.
    pub overwrite: bool,
}

/// A ready-to-run codec for one format.
#[derive(Debug, Clone)]
pub enum Codec {
    Bz2 { level: u32 },
    Zstd { external: ExternalCodec, level: Option<u32> },
}

impl Codec {
    /// Validates the level and, for delegated formats, resolves the executable.
    pub fn resolve(format: Format, level: Option<u32>) -> Result<Self, ArchiverError> {
        if let Some(level) = level {
            format.check_level(level)?;
        }
        match format {
            Format::Bz2 => Ok(Codec::Bz2 { level: level.unwrap_or(9) }),
            Format::Zstd => Ok(Codec::Zstd { external: ExternalCodec::locate("zstd")?, level }),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Codec::Bz2 { .. } => Format::Bz2,
            Codec::Zstd { .. } => Format::Zstd,
        }
    }

    /// Compresses the single file `src` into `dst`.
    pub fn compress(&self, src: &Path, dst: &Path, ctx: CodecContext) -> Result<(), ArchiverError> {
        match self {
            Codec::Bz2 { level } => {
                let reporter = ProgressReporter::new(ctx.progress);
                bz2::compress_file(src, dst, *level, &reporter)?;
                Ok(())
            }
            Codec::Zstd { external, level } => external.compress(src, dst, *level, ctx.overwrite, ctx.progress),
        }
    }

    /// Decompresses `src` into the existing file `dst`, replacing its contents.
    pub fn decompress(&self, src: &Path, dst: &Path, ctx: CodecContext) -> Result<(), ArchiverError> {
        match self {
            Codec::Bz2 { .. } => {
                let reporter = ProgressReporter::new(ctx.progress);
                bz2::decompress_file(src, dst, &reporter)?;
                Ok(())
            }
            Codec::Zstd { external, .. } => external.decompress(src, dst, ctx.progress),
        }
    }
}
