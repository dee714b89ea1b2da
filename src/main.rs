use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use vidascii::{AppConfig, AsciiPlayer, RESET};

fn load_config(explicit: Option<&PathBuf>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return AppConfig::from_file(path);
    }

    // Look for vidascii.json in app support, current dir fallback, then built-in default
    let mut tried: Vec<PathBuf> = Vec::new();
    if let Some(mut d) = dirs::data_dir() {
        d.push("vidascii");
        d.push("vidascii.json");
        tried.push(d);
    }
    tried.push(PathBuf::from("vidascii.json"));

    for p in &tried {
        if p.exists() {
            log::info!("using config {}", p.display());
            return AppConfig::from_file(p);
        }
    }

    Ok(AppConfig::default())
}

/// Reset terminal colors if playback failed part way. A finished run has
/// already been reset by the renderer.
fn restore_colors_on_error<T>(result: Result<T>, out: &mut impl Write) -> Result<T> {
    if result.is_err() {
        let _ = out.write_all(RESET.as_bytes()).and_then(|_| out.flush());
    }
    result
}

#[derive(Parser, Debug)]
#[command(version, about = "Play a video in the terminal as colored ASCII art.")]
struct Args {
    /// Video file, or a directory of png/jpg frames
    #[arg(long, short = 'v')]
    video: PathBuf,

    /// Convert every frame in parallel before playback starts
    #[arg(long, short, default_value_t = false)]
    preload: bool,

    /// Clear the screen before each frame
    #[arg(long, short, default_value_t = false)]
    clear: bool,

    /// Output width in characters (overrides the preset)
    #[arg(long)]
    width: Option<u32>,

    /// Row scale applied to the source aspect ratio (overrides the preset)
    #[arg(long)]
    aspect: Option<f32>,

    /// Playback rate for image directories
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Worker threads for --preload (defaults to one per CPU)
    #[arg(long)]
    workers: Option<usize>,

    /// Size preset from the config
    #[arg(long, conflicts_with_all = &["small", "large"])]
    preset: Option<String>,

    /// Use the small preset
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["preset", "large"])]
    small: bool,

    /// Use the large preset
    #[arg(long, short, default_value_t = false, conflicts_with_all = &["preset", "small"])]
    large: bool,

    /// Config file (default: <data dir>/vidascii/vidascii.json, then ./vidascii.json)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if !args.video.exists() {
        return Err(anyhow!("Input path does not exist: {}", args.video.display()));
    }

    let cfg = load_config(args.config.as_ref())?;
    let player = AsciiPlayer::with_config(cfg)?;

    let preset_name = if args.small {
        "small".to_string()
    } else if args.large {
        "large".to_string()
    } else {
        args.preset.clone().unwrap_or_else(|| player.config().default_preset.clone())
    };

    let mut options = player
        .options_from_preset(&preset_name)?
        .with_clear(args.clear)
        .with_preload(args.preload)
        .with_image_fps(args.fps);
    if let Some(width) = args.width {
        options = options.with_width(width);
    }
    if let Some(aspect) = args.aspect {
        options = options.with_aspect(aspect);
    }
    if let Some(workers) = args.workers {
        options = options.with_workers(workers);
    }

    let stats = restore_colors_on_error(player.play(&args.video, &options), &mut std::io::stdout())?;

    println!("Framerate: {:.2} FPS", stats.fps);
    println!("Frames: {}", stats.frames);
    println!("Height: {}", stats.height);
    println!("Width: {}", stats.width);
    println!("Execution Time: {} ms", stats.elapsed.as_millis());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_extra_reset_after_success() {
        let mut out = Vec::new();
        let value = restore_colors_on_error(Ok(7), &mut out).unwrap();
        assert_eq!(value, 7);
        assert!(out.is_empty());
    }

    #[test]
    fn test_reset_after_failed_playback() {
        let mut out = Vec::new();
        let result: Result<()> = restore_colors_on_error(Err(anyhow!("decoder died")), &mut out);
        assert!(result.is_err());
        assert_eq!(out, RESET.as_bytes());
    }
}
