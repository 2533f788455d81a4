//! Common utilities and types module.
// Shared structs, constants, etc.

use std::path::PathBuf;

/// Fixed read size of the block transfer loop.
pub const BLOCK_SIZE: usize = 1024 * 1024; // 1 MiB

/// Direction of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

/// State of one pipeline invocation, mutated block by block by the transfer engine.
#[derive(Debug, Clone)]
pub struct TransferSession {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub direction: Direction,
    /// Known when compressing (size of the input), unknown when decompressing.
    pub total_bytes: Option<u64>,
    /// Input bytes consumed so far.
    pub processed_bytes: u64,
}

impl TransferSession {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>, direction: Direction, total_bytes: Option<u64>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            direction,
            total_bytes,
            processed_bytes: 0,
        }
    }
}

/// Formats a byte count with binary units, e.g. `5.00 MiB`.
pub fn human_size(n: u64) -> String {
    let mut size = n as f64;
    for unit in ["B", "KiB", "MiB", "GiB", "TiB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} PiB", size)
}
