//! Frame sources: where decoded, pre-resized pixel grids come from.
//!
//! Video decoding is delegated to `ffmpeg`/`ffprobe` on `PATH`. Directories of
//! still images are decoded in-process with `image`.

use crate::frame::RawFrame;
use anyhow::{anyhow, bail, Context, Result};
use image::imageops::FilterType;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command as ProcCommand, Stdio};
use walkdir::WalkDir;

/// Frame rate used when a source cannot report one.
pub const FALLBACK_FPS: f64 = 30.0;

/// Sequential supplier of frames, in display order.
pub trait FrameSource {
    /// Next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<RawFrame>>;

    /// Frames per second the source was recorded at.
    fn frame_rate(&self) -> f64;

    /// Total frame count, when known up front.
    fn frame_count_hint(&self) -> Option<usize> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        (**self).next_frame()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn frame_count_hint(&self) -> Option<usize> {
        (**self).frame_count_hint()
    }
}

/// Output grid size for a `src_w x src_h` source rendered `width` glyphs wide.
///
/// Rows are `floor(width * src_h / src_w) * aspect`, which compensates for
/// terminal cells being taller than they are wide. Both sides are at least 1.
pub fn output_dimensions(src_w: u32, src_h: u32, width: u32, aspect: f32) -> (u32, u32) {
    let width = width.max(1);
    let scaled = width as u64 * src_h as u64 / src_w.max(1) as u64;
    let height = (scaled as f32 * aspect) as u32;
    (width, height.max(1))
}

/// Stream metadata reported by `ffprobe`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: Option<usize>,
}

/// Query `ffprobe` for the first video stream of `path`.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    let output = ProcCommand::new("ffprobe")
        .args(["-v", "error", "-select_streams", "v:0"])
        .args(["-show_entries", "stream=width,height,r_frame_rate,nb_frames"])
        .args(["-of", "default=noprint_wrappers=1"])
        .arg(path)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .context("running ffprobe (is it installed and on PATH?)")?;

    if !output.status.success() {
        bail!("ffprobe failed on {}", path.display());
    }

    let info = parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("probing {}", path.display()))?;
    log::info!(
        "probed {}: {}x{} @ {:.3} fps, {:?} frames",
        path.display(),
        info.width,
        info.height,
        info.fps,
        info.frame_count
    );
    Ok(info)
}

/// Parse `key=value` lines as printed by `ffprobe -of default=noprint_wrappers=1`.
pub fn parse_probe_output(text: &str) -> Result<VideoInfo> {
    let mut width = 0u32;
    let mut height = 0u32;
    let mut fps = FALLBACK_FPS;
    let mut frame_count = None;

    for line in text.lines() {
        let Some((key, val)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "width" => width = val.parse().unwrap_or(0),
            "height" => height = val.parse().unwrap_or(0),
            "r_frame_rate" => {
                // "24/1", "30000/1001"
                let (num, den) = val.split_once('/').unwrap_or((val, "1"));
                let num: f64 = num.parse().unwrap_or(0.0);
                let den: f64 = den.parse().unwrap_or(0.0);
                if num > 0.0 && den > 0.0 {
                    fps = num / den;
                }
            }
            "nb_frames" => frame_count = val.parse().ok().filter(|&n: &usize| n > 0),
            _ => {}
        }
    }

    if width == 0 || height == 0 {
        return Err(anyhow!("no decodable video stream"));
    }
    Ok(VideoInfo { width, height, fps, frame_count })
}

/// Splits a raw `rgb24` byte stream into frames of a fixed size.
pub struct RawVideoReader<R> {
    reader: R,
    width: u32,
    height: u32,
    finished: bool,
}

impl<R: Read> RawVideoReader<R> {
    pub fn new(reader: R, width: u32, height: u32) -> Self {
        Self { reader, width, height, finished: false }
    }

    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Next full frame. A trailing partial frame is treated as end of stream.
    pub fn read_frame(&mut self) -> Result<Option<RawFrame>> {
        if self.finished {
            return Ok(None);
        }
        let mut buf = vec![0u8; self.frame_len()];
        if !read_exact_or_eof(&mut self.reader, &mut buf)? {
            self.finished = true;
            return Ok(None);
        }
        Ok(Some(RawFrame::from_raw(self.width, self.height, buf)?))
    }
}

/// Fill `buf` completely. `Ok(false)` if the stream ends first.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => {
                if filled > 0 {
                    log::debug!("dropping trailing partial frame ({filled} of {} bytes)", buf.len());
                }
                return Ok(false);
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context("reading raw video stream"),
        }
    }
    Ok(true)
}

/// Decodes a video file through an `ffmpeg` child process.
pub struct FfmpegSource {
    child: Child,
    frames: RawVideoReader<BufReader<ChildStdout>>,
    info: VideoInfo,
}

impl FfmpegSource {
    /// Probe `path` and start decoding it scaled to `width` columns.
    pub fn open(path: &Path, width: u32, aspect: f32) -> Result<Self> {
        let info = probe_video(path)?;
        let (out_w, out_h) = output_dimensions(info.width, info.height, width, aspect);

        let mut child = ProcCommand::new("ffmpeg")
            .args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .arg("-vf")
            .arg(format!("scale={out_w}:{out_h}:flags=area"))
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-an", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("running ffmpeg (is it installed and on PATH?)")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout was not captured"))?;
        log::debug!("ffmpeg decoding {} at {out_w}x{out_h}", path.display());

        Ok(Self {
            child,
            frames: RawVideoReader::new(BufReader::new(stdout), out_w, out_h),
            info,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }
}

impl FrameSource for FfmpegSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let frame = self.frames.read_frame()?;
        if frame.is_none() {
            let status = self.child.wait().context("waiting for ffmpeg")?;
            if !status.success() {
                bail!("ffmpeg exited with {status}");
            }
            log::debug!("ffmpeg stream ended");
        }
        Ok(frame)
    }

    fn frame_rate(&self) -> f64 {
        self.info.fps
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.info.frame_count
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Plays a directory of still images (png, jpg) in file-name order.
pub struct ImageSequenceSource {
    paths: std::vec::IntoIter<PathBuf>,
    total: usize,
    width: u32,
    aspect: f32,
    fps: f64,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, width: u32, aspect: f32, fps: f64) -> Result<Self> {
        if !dir.is_dir() {
            bail!("{} is not a directory", dir.display());
        }
        let mut paths: Vec<PathBuf> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            })
            .collect();
        paths.sort();
        log::info!("found {} images in {}", paths.len(), dir.display());

        Ok(Self { total: paths.len(), paths: paths.into_iter(), width, aspect, fps })
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let img = image::open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let (w, h) = output_dimensions(img.width(), img.height(), self.width, self.aspect);
        let pixels = if (w, h) == (img.width(), img.height()) {
            img.to_rgb8()
        } else {
            img.resize_exact(w, h, FilterType::Lanczos3).to_rgb8()
        };
        let frame = RawFrame::from_image(pixels).with_context(|| format!("decoding {}", path.display()))?;
        Ok(Some(frame))
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn frame_count_hint(&self) -> Option<usize> {
        Some(self.total)
    }
}
