use crate::color::RESET;
use crate::frame::AsciiFrame;
use anyhow::{Context, Result};
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Moves the cursor to the top-left cell.
pub const CURSOR_HOME: &str = "\x1b[H";

/// Clears the whole screen.
pub const CLEAR_SCREEN: &str = "\x1b[2J";

/// Displays finished frames at a steady pace.
pub trait Renderer {
    /// Show one frame, optionally clearing the screen first, then wait `pace`.
    fn show(&mut self, frame: &AsciiFrame, clear_before: bool, pace: Duration) -> Result<()>;

    /// End the session, restoring default terminal colors.
    fn finish(&mut self) -> Result<()>;
}

/// Draws frames in place on an ANSI terminal.
pub struct TerminalRenderer<W: Write> {
    out: W,
    frames_shown: usize,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, frames_shown: 0 }
    }

    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn show(&mut self, frame: &AsciiFrame, clear_before: bool, pace: Duration) -> Result<()> {
        self.out.write_all(CURSOR_HOME.as_bytes()).context("writing frame")?;
        if clear_before {
            self.out.write_all(CLEAR_SCREEN.as_bytes()).context("writing frame")?;
        }
        self.out.write_all(frame.as_str().as_bytes()).context("writing frame")?;
        self.out.flush().context("flushing frame")?;
        self.frames_shown += 1;
        if !pace.is_zero() {
            thread::sleep(pace);
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.write_all(RESET.as_bytes()).context("resetting terminal colors")?;
        self.out.flush().context("flushing terminal")?;
        Ok(())
    }
}
