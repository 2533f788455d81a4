//! Block transfer engine.
//!
//! Reads the input in [`BLOCK_SIZE`] blocks and pushes every block through a
//! stateful [`Transform`], which streams what it produces into a [`Sink`] in
//! pieces of its own bounded size. On end of input the transform is flushed once.
//!
//! The engine owns one input block; the transform owns its output scratch
//! buffer. Nothing block-sized or larger is collected on the output side, so a
//! small input that expands enormously still runs in bounded memory. Output
//! already in the sink is left alone on error.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::common::{TransferSession, BLOCK_SIZE};
use crate::ArchiverError;

/// Output side of a transfer. Counts bytes and tags write errors with the destination.
pub struct Sink<'a> {
    out: &'a mut dyn Write,
    destination: &'a Path,
    written: u64,
}

impl<'a> Sink<'a> {
    pub fn new(out: &'a mut dyn Write, destination: &'a Path) -> Self {
        Self { out, destination, written: 0 }
    }

    pub fn emit(&mut self, bytes: &[u8]) -> Result<(), ArchiverError> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.out.write_all(bytes).map_err(|e| ArchiverError::io(e, self.destination))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    fn flush(&mut self) -> Result<(), ArchiverError> {
        self.out.flush().map_err(|e| ArchiverError::io(e, self.destination))
    }
}

/// One direction of one compression format.
///
/// Output does not have to line up with input blocks: a codec may buffer input
/// and release it on a later call or in `finish`. Bytes must reach the sink as
/// they are produced, before any error for the same call is returned.
pub trait Transform {
    /// Consumes all of `block`, emitting produced bytes to `sink`.
    fn feed(&mut self, block: &[u8], sink: &mut Sink<'_>) -> Result<(), ArchiverError>;

    /// Releases buffered tail bytes. Called exactly once, after the last block.
    fn finish(&mut self, sink: &mut Sink<'_>) -> Result<(), ArchiverError>;
}

/// Runs the block loop until `input` is exhausted.
///
/// `session.processed_bytes` advances by the size of every input block, and
/// `progress` is invoked after each block is consumed. Returns the number of
/// bytes written to `output`.
pub fn transfer<R, W, T>(
    input: &mut R,
    output: &mut W,
    transform: &mut T,
    session: &mut TransferSession,
    progress: &dyn Fn(&TransferSession),
) -> Result<u64, ArchiverError>
where
    R: Read + ?Sized,
    W: Write,
    T: Transform + ?Sized,
{
    let destination: PathBuf = session.destination.clone();
    let mut sink = Sink::new(output, &destination);
    let mut block = vec![0u8; BLOCK_SIZE];

    loop {
        let n = read_block(input, &mut block).map_err(|e| ArchiverError::io(e, &session.source))?;
        if n == 0 {
            transform.finish(&mut sink)?;
            break;
        }

        transform.feed(&block[..n], &mut sink)?;
        session.processed_bytes += n as u64;
        progress(session);
    }

    sink.flush()?;
    Ok(sink.written())
}

/// Fills `buf` as far as the input allows; a short count means end of input.
fn read_block<R: Read + ?Sized>(input: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
