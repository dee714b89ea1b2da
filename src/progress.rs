//! Rate-limited progress bar shared by all batch workers.
//!
//! The completion counter is a lock-free atomic. The last emitted fraction and
//! the output sink sit together behind one mutex, held only while one bar line
//! is formatted and written.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Bar width in cells.
pub const BAR_WIDTH: usize = 50;

/// Minimum fraction advance between two emitted bars.
pub const REPORT_THRESHOLD: f64 = 0.05;

// Absorbs rounding in `k/total` differences so exact 5-point steps still emit.
const THRESHOLD_SLACK: f64 = 1e-9;

struct Emitter<W> {
    last_reported: Option<f64>,
    sink: W,
}

/// Progress state for one batch conversion.
pub struct ProgressTracker<W: Write + Send> {
    completed: AtomicUsize,
    total: usize,
    emitter: Mutex<Emitter<W>>,
}

impl<W: Write + Send> ProgressTracker<W> {
    pub fn new(total: usize, sink: W) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            emitter: Mutex::new(Emitter { last_reported: None, sink }),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Frames completed so far.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Bump the completion counter and return the new count.
    pub fn record_completion(&self) -> usize {
        self.completed.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Record one finished frame and report the resulting progress.
    pub fn frame_done(&self) {
        let completed = self.record_completion();
        self.report(completed, self.total);
    }

    /// Redraw the bar if progress moved by at least [`REPORT_THRESHOLD`] since
    /// the last emitted bar, or if this is the final completion.
    ///
    /// Returns whether a bar was written.
    pub fn report(&self, completed: usize, total: usize) -> bool {
        if total == 0 {
            return false;
        }
        let fraction = (completed.min(total) as f64) / total as f64;
        let is_final = completed >= total;

        let mut emitter = match self.emitter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let due = match emitter.last_reported {
            None => true,
            Some(last) if is_final => last < 1.0,
            Some(last) => fraction - last + THRESHOLD_SLACK >= REPORT_THRESHOLD,
        };
        if !due {
            return false;
        }
        emitter.last_reported = Some(fraction);

        let line = render_bar(completed.min(total), total);
        if let Err(e) = emitter.sink.write_all(line.as_bytes()).and_then(|_| emitter.sink.flush()) {
            log::warn!("failed to write progress bar: {e}");
        }
        true
    }

    /// Last fraction written to the sink, if any.
    pub fn last_reported(&self) -> Option<f64> {
        match self.emitter.lock() {
            Ok(guard) => guard.last_reported,
            Err(poisoned) => poisoned.into_inner().last_reported,
        }
    }

    /// Terminate the bar line so later output starts on a fresh line.
    pub fn finish(&self) {
        let mut emitter = match self.emitter.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if emitter.last_reported.is_some() {
            if let Err(e) = emitter.sink.write_all(b"\n").and_then(|_| emitter.sink.flush()) {
                log::warn!("failed to terminate progress bar: {e}");
            }
        }
    }

    /// Consume the tracker and hand back its sink.
    pub fn into_sink(self) -> W {
        match self.emitter.into_inner() {
            Ok(emitter) => emitter.sink,
            Err(poisoned) => poisoned.into_inner().sink,
        }
    }
}

/// Render `[====>    ] NN %\r` for `completed` out of `total` frames.
///
/// Cell position and percentage are floored in integer arithmetic. A zero
/// `total` renders as empty.
pub fn render_bar(completed: usize, total: usize) -> String {
    let (pos, percent) = match total {
        0 => (0, 0),
        _ => {
            let completed = completed.min(total);
            (completed * BAR_WIDTH / total, completed * 100 / total)
        }
    };
    let mut line = String::with_capacity(BAR_WIDTH + 10);
    line.push('[');
    for i in 0..BAR_WIDTH {
        line.push(match i.cmp(&pos) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '>',
            std::cmp::Ordering::Greater => ' ',
        });
    }
    line.push_str("] ");
    line.push_str(&percent.to_string());
    line.push_str(" %\r");
    line
}
