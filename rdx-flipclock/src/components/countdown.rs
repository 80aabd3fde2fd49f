//! The countdown state machine.
//!
//! `Countdown` knows nothing about scheduling. The engine calls `tick()` once
//! per second and uses the `generation` counter to discard callbacks that
//! were scheduled for a lifecycle which has since been replaced or stopped.

use crate::error::{FlipclockError, Result};
use tokio::time::Instant;

/// The countdown's display-relevant state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// No timer configured.
    Idle,
    /// Counting down. Always `0 < remaining <= duration`.
    Running { remaining: u32, duration: u32 },
    /// The tick that reached zero has happened; the flash window is about to open.
    Expired { duration: u32 },
    /// Flash window open until `until`; the duration stays set so the display
    /// remains in timer mode.
    Flashing { duration: u32, until: Instant },
}

impl TimerState {
    /// True while seconds are being decremented.
    pub fn is_active(&self) -> bool {
        matches!(self, TimerState::Running { .. })
    }

    pub fn remaining_seconds(&self) -> u32 {
        match *self {
            TimerState::Running { remaining, .. } => remaining,
            _ => 0,
        }
    }

    pub fn duration_seconds(&self) -> u32 {
        match *self {
            TimerState::Idle => 0,
            TimerState::Running { duration, .. }
            | TimerState::Expired { duration }
            | TimerState::Flashing { duration, .. } => duration,
        }
    }

    pub fn is_flashing(&self) -> bool {
        matches!(self, TimerState::Flashing { .. })
    }

    /// `duration > 0 || flashing`.
    pub fn is_timer_mode(&self) -> bool {
        self.duration_seconds() > 0 || self.is_flashing()
    }
}

/// Emitted once when a running countdown reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionEvent {
    pub duration_seconds: u32,
    /// The lifecycle this completion belongs to.
    pub generation: u64,
}

/// Owns the countdown state and its lifecycle counter.
#[derive(Debug)]
pub struct Countdown {
    state: TimerState,
    generation: u64,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            generation: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Identifies the current lifecycle. Bumped by `start` and `stop`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a countdown of `minutes`, replacing whatever was in progress.
    ///
    /// Returns the countdown length in seconds. Zero minutes, or a length
    /// that does not fit in `u32` seconds, is rejected without touching state.
    pub fn start(&mut self, minutes: u32) -> Result<u32> {
        let seconds = match minutes.checked_mul(60) {
            Some(seconds) if seconds > 0 => seconds,
            _ => return Err(FlipclockError::InvalidDuration { minutes }),
        };
        self.generation += 1;
        self.state = TimerState::Running {
            remaining: seconds,
            duration: seconds,
        };
        Ok(seconds)
    }

    /// Advances a running countdown by one second.
    ///
    /// Returns the completion exactly once, on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<CompletionEvent> {
        match self.state {
            TimerState::Running {
                remaining,
                duration,
            } => {
                if remaining <= 1 {
                    self.state = TimerState::Expired { duration };
                    Some(CompletionEvent {
                        duration_seconds: duration,
                        generation: self.generation,
                    })
                } else {
                    self.state = TimerState::Running {
                        remaining: remaining - 1,
                        duration,
                    };
                    None
                }
            }
            _ => None,
        }
    }

    /// Forces the countdown back to `Idle`. Never produces a completion.
    ///
    /// Returns `true` if the display was in timer mode.
    pub fn stop(&mut self) -> bool {
        let was_timer_mode = self.state.is_timer_mode();
        self.generation += 1;
        self.state = TimerState::Idle;
        was_timer_mode
    }

    /// Opens the flash window for an expired countdown.
    pub fn begin_flash(&mut self, until: Instant) -> bool {
        match self.state {
            TimerState::Expired { duration } => {
                self.state = TimerState::Flashing { duration, until };
                true
            }
            _ => false,
        }
    }

    /// Closes the flash window, clearing the duration along with it.
    pub fn end_flash(&mut self) -> bool {
        if self.state.is_flashing() {
            self.state = TimerState::Idle;
            true
        } else {
            false
        }
    }
}
