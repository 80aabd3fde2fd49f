//! Contains common, primitive types shared across the Flipclock engine.
//!
//! This module defines the identifier used for scheduled tasks and the fixed
//! set of countdown presets offered to the user.

use serde::Deserialize;
use slotmap::new_key_type;
use std::fmt;

new_key_type! {
    /// Uniquely and safely identifies a scheduled task within the engine.
    ///
    /// Keys are never reused, so a handle retained for a superseded countdown
    /// can never cancel the task that replaced it.
    pub struct TaskId;
}

/// The kind of work a scheduled task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// The 1-second wall-clock refresh.
    Clock,
    /// The 1-second countdown decrement.
    Countdown,
    /// The one-shot return to clock mode after the flash window.
    FlashReset,
}

/// One of the four fixed countdown durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Five minutes.
    Five,
    /// Twenty-five minutes.
    TwentyFive,
    /// One hour.
    Hour,
    /// Eight hours.
    Workday,
}

impl Preset {
    /// All presets, in the order they are offered.
    pub const ALL: [Preset; 4] = [
        Preset::Five,
        Preset::TwentyFive,
        Preset::Hour,
        Preset::Workday,
    ];

    pub fn minutes(self) -> u32 {
        match self {
            Preset::Five => 5,
            Preset::TwentyFive => 25,
            Preset::Hour => 60,
            Preset::Workday => 480,
        }
    }

    /// The short button label, e.g. `"25m"` or `"8h"`.
    pub fn label(self) -> &'static str {
        match self {
            Preset::Five => "5m",
            Preset::TwentyFive => "25m",
            Preset::Hour => "1h",
            Preset::Workday => "8h",
        }
    }

    /// Looks a preset up by its button label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == label)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
