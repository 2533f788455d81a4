//! Delegated codec: runs an external executable with explicit input/output files.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::progress::Spinner;
use crate::ArchiverError;

/// An external codec executable resolved on `PATH`.
#[derive(Debug, Clone)]
pub struct ExternalCodec {
    program: &'static str,
    path: PathBuf,
}

impl ExternalCodec {
    /// Resolves `program` on the executable search path.
    ///
    /// Nothing is opened or spawned here, so a missing executable leaves no files behind.
    pub fn locate(program: &'static str) -> Result<Self, ArchiverError> {
        let path = which::which(program).map_err(|source| ArchiverError::DependencyMissing { program, source })?;
        tracing::debug!(program, path = %path.display(), "resolved external codec");
        Ok(Self { program, path })
    }

    /// `zstd [-q] [-f] [-#] -o <dst> <src>`
    pub fn compress(&self, src: &Path, dst: &Path, level: Option<u32>, overwrite: bool, progress: bool) -> Result<(), ArchiverError> {
        let mut cmd = Command::new(&self.path);
        if progress {
            cmd.arg("-q");
        }
        if overwrite {
            cmd.arg("-f");
        }
        if let Some(level) = level {
            cmd.arg(format!("-{}", level));
        }
        cmd.arg("-o").arg(dst).arg(src);
        self.run(cmd, progress)
    }

    /// `zstd [-q] -f -d <src> -o <dst>`
    ///
    /// `dst` is a pre-created staging file, hence the unconditional `-f`.
    pub fn decompress(&self, src: &Path, dst: &Path, progress: bool) -> Result<(), ArchiverError> {
        let mut cmd = Command::new(&self.path);
        if progress {
            cmd.arg("-q");
        }
        cmd.arg("-f").arg("-d").arg(src).arg("-o").arg(dst);
        self.run(cmd, progress)
    }

    /// Spawns the command and waits for it with the spinner running.
    fn run(&self, mut cmd: Command, progress: bool) -> Result<(), ArchiverError> {
        cmd.stdin(Stdio::null());
        tracing::debug!(command = ?cmd, "spawning external codec");

        let mut child = cmd.spawn().map_err(|e| ArchiverError::io(e, &self.path))?;

        let mut spinner = Spinner::new("Working", progress);
        spinner.start();
        let waited = child.wait();
        spinner.stop();

        let status = waited.map_err(|e| ArchiverError::io(e, &self.path))?;
        if !status.success() {
            tracing::debug!(program = self.program, code = ?status.code(), "external codec failed");
            return Err(ArchiverError::ExternalCodecFailed { program: self.program, code: status.code() });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_missing_program() {
        let err = ExternalCodec::locate("bzst-no-such-codec-binary").unwrap_err();
        assert!(matches!(err, ArchiverError::DependencyMissing { program: "bzst-no-such-codec-binary", .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_reported() {
        // `false` ignores its arguments and exits 1.
        let Ok(codec) = ExternalCodec::locate("false") else { return };
        let err = codec.decompress(Path::new("in.zst"), Path::new("out"), false).unwrap_err();
        assert!(matches!(err, ArchiverError::ExternalCodecFailed { code: Some(1), .. }));
    }
}
