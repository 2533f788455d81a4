//! Progress reporting for archive operations.
//!
//! Two renderers share the terminal's stderr:
//! - [`Spinner`]: a background thread drawing a rotating glyph. Used while an
//!   opaque external process runs and there is nothing to measure.
//! - [`ProgressReporter`]: byte counters drawn by the transfer engine itself
//!   after every block.
//!
//! Both are no-ops when disabled.

use std::cell::Cell;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::common::{human_size, Direction, TransferSession};

const SPINNER_GLYPHS: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_INTERVAL: Duration = Duration::from_millis(80);
const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Background ticking indicator.
///
/// `stop()` sets the shared flag, wakes the thread and joins it, so no glyph is
/// drawn after it returns. Dropping a running spinner stops it.
pub struct Spinner {
    enabled: bool,
    prefix: String,
    stop: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    pub fn new(prefix: impl Into<String>, enabled: bool) -> Self {
        Self {
            enabled,
            prefix: prefix.into(),
            stop: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    pub fn start(&mut self) {
        if !self.enabled || self.handle.is_some() {
            return;
        }
        self.stop.store(false, Ordering::SeqCst);

        let stop = Arc::clone(&self.stop);
        let ticks = Arc::clone(&self.ticks);
        let prefix = self.prefix.clone();
        self.handle = Some(thread::spawn(move || {
            let mut stderr = io::stderr();
            let mut idx = 0usize;
            while !stop.load(Ordering::SeqCst) {
                let _ = write!(stderr, "\r{} {}", prefix, SPINNER_GLYPHS[idx % SPINNER_GLYPHS.len()]);
                let _ = stderr.flush();
                ticks.fetch_add(1, Ordering::SeqCst);
                idx += 1;
                thread::park_timeout(SPINNER_INTERVAL);
            }
            let _ = write!(stderr, "\r{}\r", " ".repeat(prefix.len() + 4));
            let _ = stderr.flush();
        }));
    }

    pub fn stop(&mut self) {
        if !self.enabled {
            return;
        }
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            // A panicked spinner thread has nothing left to clean up.
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Number of glyphs drawn so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Renders `Compressed 3.00 MiB / 5.00 MiB` style lines from a [`TransferSession`].
///
/// Updates are throttled to one per 100ms; [`ProgressReporter::finish`] always
/// draws the final state and ends the line.
pub struct ProgressReporter {
    enabled: bool,
    last_emit: Cell<Option<Instant>>,
    prev_len: Cell<usize>,
    lines: Cell<u64>,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            last_emit: Cell::new(None),
            prev_len: Cell::new(0),
            lines: Cell::new(0),
        }
    }

    /// Draws the session state unless the previous update was less than 100ms ago.
    pub fn update(&self, session: &TransferSession) {
        if !self.enabled {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last_emit.get() {
            if now.duration_since(last) < REPORT_INTERVAL {
                return;
            }
        }
        self.last_emit.set(Some(now));
        self.draw(session);
    }

    pub fn finish(&self, session: &TransferSession) {
        if !self.enabled {
            return;
        }
        self.draw(session);
        eprintln!();
    }

    /// Number of lines drawn so far.
    pub fn lines_drawn(&self) -> u64 {
        self.lines.get()
    }

    fn draw(&self, session: &TransferSession) {
        let term_width = term_size::dimensions().map(|(w, _)| w).unwrap_or(80);
        let mut line = format_progress_line(session);
        line.truncate(term_width.saturating_sub(1).max(1));

        let prev = self.prev_len.replace(line.len());
        if prev > line.len() {
            line.push_str(&" ".repeat(prev - line.len()));
        }
        eprint!("\r\x1B[2K{}", line);
        io::stderr().flush().ok();
        self.lines.set(self.lines.get() + 1);
    }
}

pub(crate) fn format_progress_line(session: &TransferSession) -> String {
    let verb = match session.direction {
        Direction::Compress => "Compressed",
        Direction::Decompress => "Decompressed",
    };
    match session.total_bytes {
        Some(total) => format!("{} {} / {}", verb, human_size(session.processed_bytes), human_size(total)),
        None => format!("{} {}", verb, human_size(session.processed_bytes)),
    }
}
