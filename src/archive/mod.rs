//! # Container Codec Adapter
//!
//! Packs a directory into a single tar stream before compression, and after
//! decompression decides whether the payload is itself a tar container to be
//! unpacked or a plain file to be moved into place.
//!
//! Intermediate streams are held in a [`StagedArtifact`], a uniquely named
//! temp file that is removed when dropped unless it was moved away first.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use walkdir::WalkDir;

use crate::fsx;
use crate::ArchiverError;

pub const TAR_BLOCK: usize = 512;
const TAR_MAGIC_OFFSET: usize = 257;
const TAR_CHKSUM: std::ops::Range<usize> = 148..156;

/// A temp file holding one intermediate stage of the pipeline.
#[derive(Debug)]
pub struct StagedArtifact {
    path: TempPath,
}

impl StagedArtifact {
    /// Creates an empty, uniquely named file in the system temp directory.
    pub fn create(prefix: &str, suffix: &str) -> Result<Self, ArchiverError> {
        let file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile()
            .map_err(|e| ArchiverError::io(e, std::env::temp_dir()))?;
        let path = file.into_temp_path();
        tracing::debug!(path = %path.display(), "created staged artifact");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size on disk, `None` if the file is gone.
    pub fn size_on_disk(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    /// Moves the file to `dst`. On failure the artifact is handed back unchanged.
    pub fn move_to(self, dst: &Path) -> Result<(), (Self, io::Error)> {
        match fsx::move_file(&self.path, dst) {
            Ok(()) => {
                // Nothing left at the temp path; disarm the cleanup.
                let _ = self.path.keep();
                Ok(())
            }
            Err(e) => Err((self, e)),
        }
    }

    /// Gives up ownership, leaving the file where it is.
    pub fn keep(self) -> PathBuf {
        match self.path.keep() {
            Ok(path) => path,
            Err(e) => {
                let path = e.path.to_path_buf();
                std::mem::forget(e.path);
                path
            }
        }
    }
}

/// Writes `dir` as a tar stream whose root entry is the directory's base name.
///
/// Entries are visited in file-name order without following symlinks; symlinks
/// are stored as links. Sockets and other special files are skipped.
pub fn pack_directory(dir: &Path) -> Result<StagedArtifact, ArchiverError> {
    let root = root_name(dir)?;
    let staged = StagedArtifact::create("bzst_", ".tar")?;
    let file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(staged.path())
        .map_err(|e| ArchiverError::io(e, staged.path()))?;

    let mut builder = tar::Builder::new(BufWriter::new(file));
    builder.follow_symlinks(false);

    let mut entries = 0u64;
    for entry in WalkDir::new(dir).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            ArchiverError::io(e.into(), path)
        })?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| ArchiverError::Other(Box::new(e)))?;
        let name = if rel.as_os_str().is_empty() { root.clone() } else { root.join(rel) };

        let file_type = entry.file_type();
        let appended = if file_type.is_dir() {
            builder.append_dir(&name, entry.path())
        } else if file_type.is_file() || file_type.is_symlink() {
            builder.append_path_with_name(entry.path(), &name)
        } else {
            tracing::warn!(path = %entry.path().display(), "skipping special file");
            continue;
        };
        appended.map_err(|e| ArchiverError::io(e, entry.path()))?;
        entries += 1;
    }

    let mut writer = builder.into_inner().map_err(|e| ArchiverError::io(e, staged.path()))?;
    writer.flush().map_err(|e| ArchiverError::io(e, staged.path()))?;
    tracing::debug!(dir = %dir.display(), entries, staged = %staged.path().display(), "packed directory");
    Ok(staged)
}

/// Base name used as the container's root entry. `.` and `proj/` resolve to real names.
fn root_name(dir: &Path) -> Result<PathBuf, ArchiverError> {
    if let Some(name) = dir.file_name() {
        return Ok(PathBuf::from(name));
    }
    let canonical = fs::canonicalize(dir).map_err(|e| ArchiverError::io(e, dir))?;
    canonical
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| ArchiverError::Other(format!("cannot derive an archive name from '{}'", dir.display()).into()))
}

/// Cheap sniff: does the file start with a tar header?
pub fn is_container(path: &Path) -> io::Result<bool> {
    let mut header = Vec::with_capacity(TAR_BLOCK);
    File::open(path)?.take(TAR_BLOCK as u64).read_to_end(&mut header)?;
    Ok(looks_like_tar_header(&header))
}

/// A header qualifies when its checksum validates and it either carries the
/// `ustar` magic (POSIX and GNU) or names an entry (old v7 archives).
pub fn looks_like_tar_header(header: &[u8]) -> bool {
    if header.len() < TAR_BLOCK {
        return false;
    }
    let Some(stored) = parse_octal(&header[TAR_CHKSUM]) else {
        return false;
    };
    let computed: u64 = header[..TAR_BLOCK]
        .iter()
        .enumerate()
        .map(|(i, b)| if TAR_CHKSUM.contains(&i) { u64::from(b' ') } else { u64::from(*b) })
        .sum();
    if stored != computed {
        return false;
    }
    &header[TAR_MAGIC_OFFSET..TAR_MAGIC_OFFSET + 5] == b"ustar" || header[0] != 0
}

fn parse_octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?;
    let text = text.trim_matches(|c: char| c == '\0' || c == ' ');
    if text.is_empty() {
        return None;
    }
    u64::from_str_radix(text, 8).ok()
}

/// Extracts every entry of the tar file `archive` below `destination`.
///
/// Not transactional: entries written before a failure stay on disk.
pub fn unpack(archive: &Path, destination: &Path) -> Result<(), ArchiverError> {
    let file = File::open(archive).map_err(|e| ArchiverError::io(e, archive))?;
    let mut tar = tar::Archive::new(BufReader::new(file));
    tar.set_preserve_permissions(true);
    tar.set_preserve_mtime(true);
    tar.unpack(destination)
        .map_err(|source| ArchiverError::Extraction { source, destination: destination.to_path_buf() })
}

/// Where a decompressed payload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The payload was a container, unpacked into this directory.
    Extracted(PathBuf),
    /// The payload was moved to this file.
    File(PathBuf),
}

/// A failed placement. The staged payload is handed back for salvage.
#[derive(Debug)]
pub struct PlacementError {
    pub error: ArchiverError,
    pub staged: StagedArtifact,
}

/// Detect-and-place step of decompression.
///
/// A container is unpacked into `destination` (created as a directory when
/// missing). Anything else is moved to `destination`, or, when that is an
/// existing directory, to a file inside it named after `source` minus its
/// compression suffix. That inner file is only replaced with `force`.
pub fn place(staged: StagedArtifact, source: &Path, destination: &Path, force: bool) -> Result<Placement, PlacementError> {
    let container = match is_container(staged.path()) {
        Ok(container) => container,
        Err(e) => {
            let error = ArchiverError::io(e, staged.path());
            return Err(PlacementError { error, staged });
        }
    };

    if container {
        println!("Detected tar archive inside, extracting...");
        if let Err(error) = prepare_extraction_dir(destination).and_then(|()| unpack(staged.path(), destination)) {
            return Err(PlacementError { error, staged });
        }
        drop(staged);
        println!("Extraction complete.");
        return Ok(Placement::Extracted(destination.to_path_buf()));
    }

    let target = if destination.is_dir() {
        let target = destination.join(stripped_name(source));
        if !force && fs::symlink_metadata(&target).is_ok() {
            return Err(PlacementError { error: ArchiverError::DestinationExists(target), staged });
        }
        target
    } else {
        destination.to_path_buf()
    };

    match staged.move_to(&target) {
        Ok(()) => {
            println!("Decompressed to {}", target.display());
            Ok(Placement::File(target))
        }
        Err((staged, e)) => Err(PlacementError { error: ArchiverError::io(e, target), staged }),
    }
}

/// Makes `destination` an extraction directory. A regular file there only
/// survives preflight with `--force`, so it is replaced.
fn prepare_extraction_dir(destination: &Path) -> Result<(), ArchiverError> {
    if !destination.is_dir() && fs::symlink_metadata(destination).is_ok() {
        fs::remove_file(destination).map_err(|e| ArchiverError::io(e, destination))?;
    }
    fs::create_dir_all(destination).map_err(|e| ArchiverError::io(e, destination))
}

/// `a.bin.bz2` -> `a.bin`. Falls back to `<name>.out` when nothing would remain.
///
/// Works on the raw `OsStr`, so names that are not valid UTF-8 survive intact.
pub fn stripped_name(source: &Path) -> OsString {
    let name = Path::new(source.file_name().unwrap_or_default());
    // `extension` is `None` for dot-files like `.bz2`, which have no stem.
    match name.extension().and(name.file_stem()) {
        Some(stem) => stem.to_os_string(),
        None => {
            let mut fallback = name.as_os_str().to_os_string();
            fallback.push(".out");
            fallback
        }
    }
}
