//! Defines all public event types broadcast by the Flipclock engine.
//!
//! Renderers subscribe to `FrameEvent`s; everything else is there for logs,
//! diagnostics, and tests that need to observe the state machine.

use crate::common::{TaskId, TaskKind};
use crate::display::DisplayFrame;
use chrono::NaiveDateTime;
use tokio::time::Instant;

/// Events related to the lifecycle of the engine and its scheduled tasks.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once when the clock source is activated.
    EngineStarted { timestamp: Instant },
    /// Fired once when the engine has cancelled all of its tasks.
    EngineShutdown,
    /// Fired when a task is spawned.
    TaskScheduled { id: TaskId, kind: TaskKind },
    /// Fired when a task is cancelled before running to completion.
    TaskCancelled { id: TaskId, kind: TaskKind },
    /// A non-fatal problem reported by a collaborator, such as the window host.
    Diagnostic { message: String },
}

/// Events describing the countdown state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A countdown was installed, replacing any previous one.
    Started { minutes: u32, duration_seconds: u32 },
    /// The countdown was decremented and is still running.
    Ticked { remaining_seconds: u32 },
    /// The countdown reached zero. Fired at most once per countdown.
    Completed { duration_seconds: u32 },
    /// The flash window closed on its own and clock mode resumed.
    FlashEnded,
    /// The user stopped the timer (or cleared the flash) early.
    Stopped,
    /// A start request was refused; nothing changed.
    Rejected { minutes: u32 },
}

/// A freshly selected frame, fired whenever the display may have changed.
#[derive(Debug, Clone)]
pub struct FrameEvent {
    pub frame: DisplayFrame,
    pub clock_time: NaiveDateTime,
}
