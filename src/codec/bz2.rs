//! In-process bzip2 codec on top of libbz2's raw stream API.

use std::fs::File;
use std::path::{Path, PathBuf};

use bzip2::{Action, Compress, Compression, Decompress, Status};

use crate::block_pipeline::{self, Sink, Transform};
use crate::common::{Direction, TransferSession};
use crate::progress::ProgressReporter;
use crate::ArchiverError;

/// Size of the scratch buffer every libbz2 call writes into. Each call's
/// output goes to the sink before the next call, so this bounds codec memory.
pub const OUT_CHUNK: usize = 64 * 1024;

/// libbz2's default work factor.
const WORK_FACTOR: u32 = 30;

pub struct Bz2Encoder {
    raw: Compress,
    buf: Vec<u8>,
    path: PathBuf,
}

impl Bz2Encoder {
    /// `path` names the input for error messages.
    pub fn new(level: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            raw: Compress::new(Compression::new(level), WORK_FACTOR),
            buf: Vec::with_capacity(OUT_CHUNK),
            path: path.into(),
        }
    }

    fn err(&self, source: bzip2::Error) -> ArchiverError {
        ArchiverError::Bz2 { source, path: self.path.clone() }
    }
}

impl Transform for Bz2Encoder {
    fn feed(&mut self, block: &[u8], sink: &mut Sink<'_>) -> Result<(), ArchiverError> {
        let mut rest = block;
        loop {
            self.buf.clear();
            let before = self.raw.total_in();
            let result = self.raw.compress_vec(rest, &mut self.buf, Action::Run);
            rest = &rest[(self.raw.total_in() - before) as usize..];
            sink.emit(&self.buf)?;
            result.map_err(|e| self.err(e))?;
            // A full buffer may mean more output is pending.
            if rest.is_empty() && self.buf.len() < self.buf.capacity() {
                return Ok(());
            }
        }
    }

    fn finish(&mut self, sink: &mut Sink<'_>) -> Result<(), ArchiverError> {
        loop {
            self.buf.clear();
            let result = self.raw.compress_vec(&[], &mut self.buf, Action::Finish);
            sink.emit(&self.buf)?;
            if let Status::StreamEnd = result.map_err(|e| self.err(e))? {
                return Ok(());
            }
        }
    }
}

/// Streaming bzip2 decoder. Concatenated streams decode back to back.
pub struct Bz2Decoder {
    raw: Decompress,
    buf: Vec<u8>,
    path: PathBuf,
    stream_ended: bool,
}

impl Bz2Decoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            raw: Decompress::new(false),
            buf: Vec::with_capacity(OUT_CHUNK),
            path: path.into(),
            stream_ended: false,
        }
    }
}

impl Transform for Bz2Decoder {
    fn feed(&mut self, block: &[u8], sink: &mut Sink<'_>) -> Result<(), ArchiverError> {
        let mut rest = block;
        loop {
            if self.stream_ended {
                if rest.is_empty() {
                    return Ok(());
                }
                self.raw = Decompress::new(false);
                self.stream_ended = false;
            }

            self.buf.clear();
            let before = self.raw.total_in();
            let result = self.raw.decompress_vec(rest, &mut self.buf);
            rest = &rest[(self.raw.total_in() - before) as usize..];
            // Bytes decoded ahead of a bad spot still reach the sink.
            sink.emit(&self.buf)?;

            match result.map_err(|source| ArchiverError::Bz2 { source, path: self.path.clone() })? {
                Status::StreamEnd => self.stream_ended = true,
                Status::MemNeeded => {
                    return Err(ArchiverError::Other("libbz2 ran out of memory".into()));
                }
                _ => {}
            }

            // libbz2 can hold decoded output after swallowing all of the input;
            // keep draining while it fills the buffer.
            let drained = self.buf.len() < self.buf.capacity();
            if rest.is_empty() && drained && !self.stream_ended {
                return Ok(());
            }
        }
    }

    fn finish(&mut self, _sink: &mut Sink<'_>) -> Result<(), ArchiverError> {
        // `feed` drains libbz2 completely, so there is no tail once the
        // end-of-stream marker was seen.
        if !self.stream_ended {
            return Err(ArchiverError::Truncated { path: self.path.clone() });
        }
        Ok(())
    }
}

/// Compresses `src` into a new bz2 file at `dst`.
pub fn compress_file(src: &Path, dst: &Path, level: u32, reporter: &ProgressReporter) -> Result<TransferSession, ArchiverError> {
    let mut input = File::open(src).map_err(|e| ArchiverError::io(e, src))?;
    let total = input.metadata().map_err(|e| ArchiverError::io(e, src))?.len();
    let mut output = File::create(dst).map_err(|e| ArchiverError::io(e, dst))?;

    let mut session = TransferSession::new(src, dst, Direction::Compress, Some(total));
    let mut encoder = Bz2Encoder::new(level, src);
    let written = block_pipeline::transfer(&mut input, &mut output, &mut encoder, &mut session, &|s| reporter.update(s))?;
    reporter.finish(&session);

    tracing::debug!(src = %src.display(), dst = %dst.display(), read = session.processed_bytes, written, "bz2 compression done");
    Ok(session)
}

/// Decodes the bz2 file `src` into `dst`, truncating `dst` first.
pub fn decompress_file(src: &Path, dst: &Path, reporter: &ProgressReporter) -> Result<TransferSession, ArchiverError> {
    let mut input = File::open(src).map_err(|e| ArchiverError::io(e, src))?;
    let mut output = File::create(dst).map_err(|e| ArchiverError::io(e, dst))?;

    let mut session = TransferSession::new(src, dst, Direction::Decompress, None);
    let mut decoder = Bz2Decoder::new(src);
    let written = block_pipeline::transfer(&mut input, &mut output, &mut decoder, &mut session, &|s| reporter.update(s))?;
    reporter.finish(&session);

    tracing::debug!(src = %src.display(), dst = %dst.display(), read = session.processed_bytes, written, "bz2 decompression done");
    Ok(session)
}
