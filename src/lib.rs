//! # vidascii - colored ASCII video in the terminal
//!
//! `vidascii` turns decoded video frames into true-color ASCII art and plays
//! them back in place on an ANSI terminal.
//!
//! ## Features
//!
//! - Brightness-to-glyph mapping over a configurable character ramp
//! - 24-bit foreground color per glyph
//! - Parallel batch conversion with ordered results and a shared progress bar
//! - Streaming playback that converts one frame at a time
//! - Video decoding through `ffmpeg`, or playback of an image directory
//!
//! ## Example
//!
//! ```
//! use vidascii::{Dispatcher, FrameConverter, RawFrame};
//! use image::Rgb;
//!
//! let frames: Vec<RawFrame> = (0..8u8)
//!     .map(|i| RawFrame::from_fn(4, 2, |_, _| Rgb([i * 30, i * 30, i * 30])).unwrap())
//!     .collect();
//! let ascii = Dispatcher::new(3).convert_batch(&frames, &FrameConverter::default(), std::io::sink());
//! assert_eq!(ascii.len(), 8);
//! assert_eq!(ascii[0].as_str().lines().count(), 2);
//! ```
//!
//! ## Playing a file
//!
//! ```no_run
//! use vidascii::AsciiPlayer;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let player = AsciiPlayer::new();
//! let options = player.options_from_preset("default")?.with_preload(true);
//! let stats = player.play(Path::new("video.mp4"), &options)?;
//! println!("{} frames at {:.2} fps", stats.frames, stats.fps);
//! # Ok(())
//! # }
//! ```

pub mod color;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod glyph;
pub mod player;
pub mod progress;
pub mod render;
pub mod source;

pub use color::{encode_pixel, RESET};
pub use dispatch::{default_worker_count, partition, Dispatcher};
pub use error::ConvertError;
pub use frame::{convert, AsciiFrame, FrameConverter, RawFrame};
pub use glyph::{GlyphRamp, DEFAULT_RAMP};
pub use player::{play_preloaded, play_streaming, PlaybackStats};
pub use progress::ProgressTracker;
pub use render::{Renderer, TerminalRenderer};
pub use source::{FfmpegSource, FrameSource, ImageSequenceSource};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Output size preset.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Preset {
    /// Output width in glyphs.
    pub width: u32,
    /// Row scale applied after keeping the source aspect ratio.
    pub aspect: f32,
}

fn default_ascii_chars() -> String {
    DEFAULT_RAMP.to_string()
}

/// Application configuration: size presets, glyph ramp and worker count.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub presets: HashMap<String, Preset>,
    pub default_preset: String,
    #[serde(default = "default_ascii_chars")]
    pub ascii_chars: String,
    /// Batch workers; `None` means one per hardware thread.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let presets = [("default", 480, 0.4), ("small", 160, 0.4), ("large", 800, 0.4)]
            .into_iter()
            .map(|(name, width, aspect)| (name.to_string(), Preset { width, aspect }))
            .collect();
        Self {
            presets,
            default_preset: "default".to_string(),
            ascii_chars: default_ascii_chars(),
            workers: None,
        }
    }
}

impl AppConfig {
    /// Load and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text).context("parsing config json")?;
        config.validate().with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        GlyphRamp::new(&self.ascii_chars)?;
        if !self.presets.contains_key(&self.default_preset) {
            return Err(anyhow!("default preset '{}' is not defined", self.default_preset));
        }
        Ok(())
    }
}

/// Resolved options for one playback run.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output width in glyphs.
    pub width: u32,
    /// Row scale, see [`source::output_dimensions`].
    pub aspect: f32,
    /// Glyphs ordered darkest to brightest.
    pub ascii_chars: String,
    /// Batch workers; `None` means one per hardware thread.
    pub workers: Option<usize>,
    /// Clear the screen before every frame instead of only homing the cursor.
    pub clear: bool,
    /// Convert the whole video up front, in parallel, before playing.
    pub preload: bool,
    /// Playback rate for image directories.
    pub image_fps: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 480,
            aspect: 0.4,
            ascii_chars: default_ascii_chars(),
            workers: None,
            clear: false,
            preload: false,
            image_fps: source::FALLBACK_FPS,
        }
    }
}

impl RenderOptions {
    pub fn with_width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_ascii_chars(mut self, ascii_chars: String) -> Self {
        self.ascii_chars = ascii_chars;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn with_clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn with_preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    pub fn with_image_fps(mut self, fps: f64) -> Self {
        self.image_fps = fps;
        self
    }

    pub fn from_preset(preset: &Preset, ascii_chars: String) -> Self {
        Self { width: preset.width, aspect: preset.aspect, ascii_chars, ..Self::default() }
    }

    pub fn converter(&self) -> Result<FrameConverter> {
        Ok(FrameConverter::new(GlyphRamp::new(&self.ascii_chars)?))
    }

    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::new(self.workers.unwrap_or_else(default_worker_count))
    }
}

/// Plays videos and image directories as colored ASCII.
pub struct AsciiPlayer {
    config: AppConfig,
}

impl AsciiPlayer {
    pub fn new() -> Self {
        Self { config: AppConfig::default() }
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn get_preset(&self, name: &str) -> Option<&Preset> {
        self.config.presets.get(name)
    }

    /// Options for a named preset, carrying the configured ramp and workers.
    pub fn options_from_preset(&self, preset_name: &str) -> Result<RenderOptions> {
        let preset = self
            .get_preset(preset_name)
            .ok_or_else(|| anyhow!("Preset '{}' not found", preset_name))?;
        let mut options = RenderOptions::from_preset(preset, self.config.ascii_chars.clone());
        options.workers = self.config.workers;
        Ok(options)
    }

    /// Open a video file, or an image directory, as a frame source.
    pub fn open_source(&self, input: &Path, options: &RenderOptions) -> Result<Box<dyn FrameSource>> {
        if input.is_dir() {
            Ok(Box::new(ImageSequenceSource::open(input, options.width, options.aspect, options.image_fps)?))
        } else if input.is_file() {
            Ok(Box::new(FfmpegSource::open(input, options.width, options.aspect)?))
        } else {
            Err(anyhow!("Input path does not exist: {}", input.display()))
        }
    }

    /// Play `input` on stdout, streaming or preloaded per `options`.
    pub fn play(&self, input: &Path, options: &RenderOptions) -> Result<PlaybackStats> {
        let converter = options.converter()?;
        let mut source = self.open_source(input, options)?;
        let mut renderer = TerminalRenderer::stdout();
        if options.preload {
            let dispatcher = options.dispatcher();
            log::info!("preloading with {} workers", dispatcher.workers());
            play_preloaded(&mut source, &converter, &dispatcher, std::io::stdout(), &mut renderer, options.clear)
        } else {
            play_streaming(&mut source, &converter, &mut renderer, options.clear)
        }
    }
}

impl Default for AsciiPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.presets["default"], Preset { width: 480, aspect: 0.4 });
        assert_eq!(config.ascii_chars, ".-:=+*%#@$");
    }

    #[test]
    fn test_config_from_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidascii.json");
        fs::write(&path, r#"{"presets": {"tiny": {"width": 40, "aspect": 0.5}}, "default_preset": "tiny"}"#).unwrap();
        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.ascii_chars, DEFAULT_RAMP);
        assert_eq!(config.workers, None);
        assert_eq!(config.presets["tiny"].width, 40);
    }

    #[test]
    fn test_config_rejects_non_ascii_ramp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vidascii.json");
        fs::write(
            &path,
            r#"{"presets": {"a": {"width": 40, "aspect": 0.5}}, "default_preset": "a", "ascii_chars": " ░▒▓█"}"#,
        )
        .unwrap();
        assert!(AppConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_config_rejects_missing_default_preset() {
        let mut config = AppConfig::default();
        config.default_preset = "huge".to_string();
        assert!(AsciiPlayer::with_config(config).is_err());
    }

    #[test]
    fn test_options_from_preset() {
        let mut config = AppConfig::default();
        config.workers = Some(3);
        config.ascii_chars = " .#".to_string();
        let player = AsciiPlayer::with_config(config).unwrap();
        let options = player.options_from_preset("small").unwrap();
        assert_eq!(options.width, 160);
        assert_eq!(options.ascii_chars, " .#");
        assert_eq!(options.dispatcher().workers(), 3);
        assert_eq!(options.converter().unwrap().ramp().len(), 3);
        assert!(player.options_from_preset("missing").is_err());
    }

    #[test]
    fn test_options_workers_clamped() {
        assert_eq!(RenderOptions::default().with_workers(0).dispatcher().workers(), 1);
        assert!(RenderOptions::default().dispatcher().workers() >= 1);
    }

    #[test]
    fn test_open_source_missing_path() {
        let player = AsciiPlayer::new();
        let err = player.open_source(Path::new("/definitely/not/here.mp4"), &RenderOptions::default());
        assert!(err.is_err());
    }
}
