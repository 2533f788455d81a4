//! # bzst Core Library
//!
//! This crate provides the core functionality for the `bzst` archiver: one
//! invocation compresses a file or directory into `.bz2`/`.zst`, or decompresses
//! one back, with the mode inferred from the file names.
//!
//! It is designed to be used by the `bzst` command-line application, but [`operation::run`]
//! can also be called directly.
//!
//! ## Key Modules
//!
//! - [`operation`]: Mode inference, preflight checks and dispatch.
//! - [`block_pipeline`]: The 1 MiB block engine that drives in-process codecs.
//! - [`codec`]: The bzip2 codec and the external `zstd` adapter.
//! - [`archive`]: Tar packing, tar detection and staged temp files.
//! - [`compress`] / [`extract`]: The two directions, including recovery of partial output.
//!
//! ## Examples
//!
//! ```no_run
//! use bzst::operation::{self, OperationOptions};
//! use std::path::Path;
//!
//! let options = OperationOptions { level: Some(6), ..Default::default() };
//! operation::run(Path::new("notes.txt"), Path::new("notes.txt.bz2"), &options)?;
//! # Ok::<(), bzst::ArchiverError>(())
//! ```

pub mod archive;
pub mod block_pipeline;
pub mod cli;
pub mod cli_runner;
pub mod codec;
pub mod common;
pub mod compress;
pub mod error;
pub mod extract;
pub mod operation;
pub mod progress;
pub use error::ArchiverError;

// Cross-platform filesystem helpers
pub mod fsx;
