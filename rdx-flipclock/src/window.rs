//! The host window capability, used only for the fullscreen toggle.

use crate::error::{FlipclockError, Result};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait WindowHost: Send + Sync {
    /// Flips fullscreen on or off and returns the new state.
    fn toggle_fullscreen(&self) -> Result<bool>;
}

/// Used when no window is attached; every request is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessWindow;

impl WindowHost for HeadlessWindow {
    fn toggle_fullscreen(&self) -> Result<bool> {
        Err(FlipclockError::Fullscreen("no window attached".to_string()))
    }
}

/// Treats the terminal's alternate screen buffer as "fullscreen".
#[derive(Debug, Default)]
pub struct TerminalWindow {
    fullscreen: AtomicBool,
}

impl TerminalWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

impl WindowHost for TerminalWindow {
    fn toggle_fullscreen(&self) -> Result<bool> {
        let enter = !self.fullscreen.load(Ordering::SeqCst);
        let sequence: &[u8] = if enter {
            b"\x1b[?1049h\x1b[H"
        } else {
            b"\x1b[?1049l"
        };
        let mut stdout = std::io::stdout();
        stdout
            .write_all(sequence)
            .and_then(|_| stdout.flush())
            .map_err(|e| FlipclockError::Fullscreen(e.to_string()))?;
        self.fullscreen.store(enter, Ordering::SeqCst);
        Ok(enter)
    }
}

impl Drop for TerminalWindow {
    fn drop(&mut self) {
        if self.is_fullscreen() {
            let mut stdout = std::io::stdout();
            stdout.write_all(b"\x1b[?1049l").ok();
            stdout.flush().ok();
        }
    }
}
