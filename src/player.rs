//! Drives a source through conversion into a renderer.
//!
//! Streaming mode converts and shows one frame at a time on the calling
//! thread. Preload mode decodes everything, converts the whole batch in
//! parallel, then shows the results in order.

use crate::dispatch::Dispatcher;
use crate::frame::{FrameConverter, RawFrame};
use crate::render::Renderer;
use crate::source::{FrameSource, FALLBACK_FPS};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::{Duration, Instant};

// Upper bound on frames reserved up front from a source's count hint.
const PRELOAD_RESERVE_LIMIT: usize = 4096;

/// Summary of one playback session.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStats {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub elapsed: Duration,
}

/// Delay between frames for a given rate. Non-positive rates fall back to 30 fps.
pub fn frame_interval(fps: f64) -> Duration {
    let fps = if fps.is_finite() && fps > 0.0 { fps } else { FALLBACK_FPS };
    Duration::from_secs_f64(1.0 / fps)
}

/// Convert and show frames one by one until the source runs dry.
pub fn play_streaming<S, R>(source: &mut S, converter: &FrameConverter, renderer: &mut R, clear: bool) -> Result<PlaybackStats>
where
    S: FrameSource + ?Sized,
    R: Renderer + ?Sized,
{
    let started = Instant::now();
    let fps = source.frame_rate();
    let pace = frame_interval(fps);
    let mut stats = PlaybackStats { frames: 0, width: 0, height: 0, fps, elapsed: Duration::ZERO };

    while let Some(raw) = source.next_frame()? {
        let frame = converter.convert(&raw);
        stats.width = frame.width();
        stats.height = frame.height();
        renderer.show(&frame, clear, pace)?;
        stats.frames += 1;
    }

    renderer.finish()?;
    stats.elapsed = started.elapsed();
    Ok(stats)
}

/// Pull every frame from `source` into memory.
pub fn preload<S>(source: &mut S) -> Result<Vec<RawFrame>>
where
    S: FrameSource + ?Sized,
{
    let bar = match source.frame_count_hint() {
        Some(total) => {
            let bar = ProgressBar::new(total as u64);
            if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} decoding [{bar:40.cyan/blue}] {pos}/{len}") {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        }
        None => ProgressBar::new_spinner().with_message("decoding"),
    };

    let mut frames = Vec::with_capacity(source.frame_count_hint().unwrap_or(0).min(PRELOAD_RESERVE_LIMIT));
    while let Some(frame) = source.next_frame()? {
        frames.push(frame);
        bar.inc(1);
    }
    bar.finish_and_clear();
    log::info!("decoded {} frames", frames.len());
    Ok(frames)
}

/// Decode everything, convert it in parallel with a bar on `progress_sink`,
/// then show the frames in order.
pub fn play_preloaded<S, R, W>(
    source: &mut S,
    converter: &FrameConverter,
    dispatcher: &Dispatcher,
    progress_sink: W,
    renderer: &mut R,
    clear: bool,
) -> Result<PlaybackStats>
where
    S: FrameSource + ?Sized,
    R: Renderer + ?Sized,
    W: Write + Send,
{
    let started = Instant::now();
    let fps = source.frame_rate();
    let pace = frame_interval(fps);

    let raw = preload(source)?;
    let converted = dispatcher.convert_batch(&raw, converter, progress_sink);
    drop(raw);

    for frame in &converted {
        renderer.show(frame, clear, pace)?;
    }
    renderer.finish()?;

    let (width, height) = converted.first().map_or((0, 0), |f| (f.width(), f.height()));
    Ok(PlaybackStats { frames: converted.len(), width, height, fps, elapsed: started.elapsed() })
}
