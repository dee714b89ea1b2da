//! Batch conversion across a fixed worker pool.
//!
//! Frames are split into contiguous index ranges, one per worker. Each worker
//! owns the matching disjoint slice of a pre-sized output vector, so results
//! land in input order without any merge step or per-slot locking.

use crate::frame::{AsciiFrame, FrameConverter, RawFrame};
use crate::progress::ProgressTracker;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::io::Write;
use std::num::NonZeroUsize;
use std::ops::Range;

/// Number of hardware execution units, at least 1.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

/// Split `len` indices into `workers` contiguous ranges.
///
/// Every range but the last holds `len / workers` indices; the last takes the
/// remainder. When `len < workers` the leading ranges are empty. A worker count
/// of zero is treated as one.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let chunk = len / workers;
    (0..workers)
        .map(|i| {
            let start = i * chunk;
            let end = if i + 1 == workers { len } else { start + chunk };
            start..end
        })
        .collect()
}

/// Converts whole batches of frames in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatcher {
    workers: usize,
}

impl Dispatcher {
    /// Dispatcher with a fixed worker count, clamped to at least 1.
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Convert every frame, preserving order. Blocks until all workers finish.
    ///
    /// Progress for this batch is drawn on `progress_sink`, ending with the
    /// 100% bar and a newline. A panic in any worker propagates out of this
    /// call, aborting the batch.
    pub fn convert_batch<W>(&self, frames: &[RawFrame], converter: &FrameConverter, progress_sink: W) -> Vec<AsciiFrame>
    where
        W: Write + Send,
    {
        if frames.is_empty() {
            return Vec::new();
        }

        let ranges: Vec<Range<usize>> = partition(frames.len(), self.workers)
            .into_iter()
            .filter(|r| !r.is_empty())
            .collect();
        log::debug!("converting {} frames on {} workers: {:?}", frames.len(), ranges.len(), ranges);

        let pool = match ThreadPoolBuilder::new()
            .num_threads(ranges.len())
            .thread_name(|i| format!("vidascii-worker-{i}"))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("could not start {} workers ({e}), converting on one thread", ranges.len());
                None
            }
        };

        let progress = ProgressTracker::new(frames.len(), progress_sink);
        let output = convert_ranges(pool.as_ref(), &ranges, frames, converter, &progress);
        progress.finish();
        output
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(default_worker_count())
    }
}

/// Convert `frames` with one pool task per range, or on the calling thread
/// when there is no pool. `ranges` must tile `0..frames.len()` in order.
fn convert_ranges<W>(
    pool: Option<&ThreadPool>,
    ranges: &[Range<usize>],
    frames: &[RawFrame],
    converter: &FrameConverter,
    progress: &ProgressTracker<W>,
) -> Vec<AsciiFrame>
where
    W: Write + Send,
{
    let mut output = vec![AsciiFrame::default(); frames.len()];
    match pool {
        Some(pool) => pool.scope(|scope| {
            let mut rest = output.as_mut_slice();
            for range in ranges {
                let (slots, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
                rest = tail;
                let inputs = &frames[range.clone()];
                scope.spawn(move |_| convert_into(inputs, slots, converter, progress));
            }
        }),
        None => convert_into(frames, &mut output, converter, progress),
    }
    output
}

fn convert_into<W>(inputs: &[RawFrame], slots: &mut [AsciiFrame], converter: &FrameConverter, progress: &ProgressTracker<W>)
where
    W: Write + Send,
{
    for (slot, frame) in slots.iter_mut().zip(inputs) {
        *slot = converter.convert(frame);
        progress.frame_done();
    }
}
