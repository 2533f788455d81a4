//! # Decompression Path
//!
//! The compressed source is decoded in full into a staged file, which is then
//! handed to [`archive::place`] to be unpacked or moved into place.
//!
//! When anything fails after staging began, the decoded bytes are not thrown
//! away: [`salvage`] moves them to (or under) the destination before the
//! original error is returned.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::archive::{self, Placement, PlacementError, StagedArtifact};
use crate::codec::{Codec, CodecContext, Format};
use crate::fsx;
use crate::operation::OperationOptions;
use crate::ArchiverError;

pub fn run(source: &Path, destination: &Path, format: Format, options: &OperationOptions) -> Result<Placement, ArchiverError> {
    let codec = Codec::resolve(format, options.level)?;
    let staged = StagedArtifact::create("bzst_out_", "")?;
    // The staged file already exists, so the codec is always allowed to replace it.
    let ctx = CodecContext { progress: options.progress, overwrite: true };

    if let Err(error) = codec.decompress(source, staged.path(), ctx) {
        salvage(staged, source, destination, options.force, false);
        return Err(error);
    }

    match archive::place(staged, source, destination, options.force) {
        Ok(placement) => {
            tracing::info!(format = %format, source = %source.display(), ?placement, "decompressed");
            Ok(placement)
        }
        Err(PlacementError { error, staged }) => {
            salvage(staged, source, destination, options.force, true);
            Err(error)
        }
    }
}

/// Moves a staged payload left over by a failed decompression into place.
///
/// Targets `destination` itself, or `<destination>/<source-name>.out` when the
/// destination is a directory. Without `force` an occupied target gets a
/// numeric suffix instead of being replaced. If the move fails the file is kept
/// at its temp path. Returns where the bytes ended up.
///
/// `decoded_in_full` says the codec finished; its output is kept even when
/// empty. After a codec failure an empty payload holds nothing and is dropped.
pub fn salvage(staged: StagedArtifact, source: &Path, destination: &Path, force: bool, decoded_in_full: bool) -> Option<PathBuf> {
    match staged.size_on_disk() {
        None => return None,
        Some(0) if !decoded_in_full => {
            tracing::debug!(path = %staged.path().display(), "nothing was decoded, nothing to salvage");
            return None;
        }
        Some(_) => {}
    }

    let target = salvage_target(source, destination, force);
    match staged.move_to(&target) {
        Ok(()) => {
            println!("Decompressed to {} (post-error move)", target.display());
            Some(target)
        }
        Err((staged, e)) => {
            let kept = staged.keep();
            tracing::warn!(
                target = %target.display(),
                kept = %kept.display(),
                error = %e,
                "could not move decompressed data into place; it was left at the temp path"
            );
            Some(kept)
        }
    }
}

fn salvage_target(source: &Path, destination: &Path, force: bool) -> PathBuf {
    let target = if destination.is_dir() {
        let mut name = source.file_name().map(OsString::from).unwrap_or_else(|| OsString::from("payload"));
        name.push(".out");
        destination.join(name)
    } else {
        destination.to_path_buf()
    };
    if force {
        target
    } else {
        fsx::first_free_path(&target)
    }
}
