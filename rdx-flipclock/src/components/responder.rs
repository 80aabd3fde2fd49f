//! Turns a countdown completion into the alert tone and the flash window.

use crate::components::alert::AlertHandle;
use crate::components::countdown::{CompletionEvent, Countdown};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// How long the display flashes after a countdown completes.
pub const FLASH_WINDOW: Duration = Duration::from_secs(5);

/// An open flash window, to be closed by the engine's reset task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashWindow {
    pub generation: u64,
    pub until: Instant,
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionResponder {
    window: Duration,
}

impl Default for CompletionResponder {
    fn default() -> Self {
        Self::new(FLASH_WINDOW)
    }
}

impl CompletionResponder {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Sounds the alert and opens the flash window.
    ///
    /// Returns `None` for a completion from a superseded lifecycle. The alert
    /// is only queued, so audio never delays or prevents the flash.
    pub fn respond(
        &self,
        countdown: &mut Countdown,
        alert: &AlertHandle,
        event: CompletionEvent,
        now: Instant,
    ) -> Option<FlashWindow> {
        if event.generation != countdown.generation() {
            debug!("Ignoring completion from generation {}.", event.generation);
            return None;
        }
        alert.sound();

        let until = now + self.window;
        if !countdown.begin_flash(until) {
            return None;
        }
        info!(
            "Timer of {}s complete; flashing for {:?}.",
            event.duration_seconds, self.window
        );
        Some(FlashWindow {
            generation: event.generation,
            until,
        })
    }

    /// Closes the flash window and returns the display to clock mode.
    ///
    /// Does nothing if the user has stopped or restarted the timer since the
    /// window opened.
    pub fn close(&self, countdown: &mut Countdown, window: &FlashWindow) -> bool {
        if countdown.generation() != window.generation {
            return false;
        }
        countdown.end_flash()
    }
}
