//! # Compression Path
//!
//! A directory source is packed into a staged tar first; the single resulting
//! stream (or the source file itself) is then compressed into the destination.
//! The staged tar is removed whatever the outcome.

use std::fs;
use std::path::Path;

use crate::archive;
use crate::codec::{Codec, CodecContext, Format};
use crate::operation::OperationOptions;
use crate::ArchiverError;

pub fn run(source: &Path, destination: &Path, format: Format, options: &OperationOptions) -> Result<(), ArchiverError> {
    // Resolved before anything is staged, so a missing executable leaves no files behind.
    let codec = Codec::resolve(format, options.level)?;
    let ctx = CodecContext { progress: options.progress, overwrite: options.force };

    let staged = if source.is_dir() {
        println!("Source is a directory; creating tar archive...");
        Some(archive::pack_directory(source)?)
    } else {
        None
    };
    let input = staged.as_ref().map_or(source, |s| s.path());

    let destination_existed = destination.exists();
    if let Err(e) = codec.compress(input, destination, ctx) {
        if !destination_existed && destination.is_file() {
            tracing::debug!(path = %destination.display(), "removing partial compressed output");
            if let Err(rm) = fs::remove_file(destination) {
                tracing::warn!(path = %destination.display(), error = %rm, "could not remove partial output");
            }
        }
        return Err(e);
    }

    tracing::info!(format = %codec.format(), source = %source.display(), destination = %destination.display(), "compressed");
    println!("Done.");
    Ok(())
}
