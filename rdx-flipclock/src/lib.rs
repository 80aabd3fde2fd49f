//! # Flipclock
//!
//! A tick-driven flip clock display with preset countdown timers.
//!
//! Flipclock shows the current time and date on two "cards" and a subtitle
//! line. Starting one of four preset countdowns switches the cards to the
//! remaining time; when the countdown reaches zero the engine plays a short
//! descending tone and flashes the display for five seconds before returning
//! to the clock.
//!
//! ## Core Concepts
//!
//! - **SystemClock**: refreshes the wall-clock time once per second.
//! - **Countdown**: a tagged state machine (`Idle`, `Running`, `Expired`,
//!   `Flashing`) that makes invalid timer combinations unrepresentable.
//! - **CompletionResponder**: turns a completion into the alert tone and a
//!   five-second flash window.
//! - **AlertSynthesizer**: renders the tone and owns the session's single,
//!   lazily opened audio context.
//! - **Display selection**: a pure function from the clock time and countdown
//!   state to the strings that get drawn.
//!
//! ## Audio
//!
//! By default the alert rings the terminal bell. The rendered tone, a sine
//! sweep from 200 Hz down to 100 Hz, is only heard through the system audio
//! device when the crate is built with the `audio` feature, which plays it
//! with rodio.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use flipclock::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = FlipclockEngine::new(FlipclockConfig::default());
//!
//!     let mut frames = engine.subscribe_frames();
//!     tokio::spawn(async move {
//!         while let Ok(event) = frames.recv().await {
//!             println!("{}", flipclock::render::render_frame(&event.frame));
//!         }
//!     });
//!
//!     engine.start_preset(Preset::TwentyFive).await?;
//!
//!     // Runs until Ctrl+C.
//!     engine.run().await?;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Flipclock";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod events;
pub mod format;
pub mod render;
pub mod time;
pub mod window;

/// A prelude module for easy importing of the most common Flipclock types.
pub mod prelude {
    pub use crate::common::{Preset, TaskId, TaskKind};
    pub use crate::components::alert::{AudioContext, AudioHost, BellHost, NullAudioHost};
    pub use crate::components::countdown::TimerState;
    pub use crate::config::{AudioConfig, FlipclockConfig};
    pub use crate::display::DisplayFrame;
    pub use crate::engine::{FlipclockEngine, TimerSnapshot};
    pub use crate::error::FlipclockError;
    pub use crate::events::{FrameEvent, SystemEvent, TimerEvent};
    pub use crate::time::{FixedTimeSource, SystemTimeSource, TimeSource};
    pub use crate::window::{HeadlessWindow, TerminalWindow, WindowHost};
}
