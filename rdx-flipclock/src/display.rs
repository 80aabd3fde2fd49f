//! Maps the wall clock and countdown state onto the two cards and subtitle.

use crate::components::countdown::TimerState;
use crate::format::{format_clock, format_countdown, format_date};
use chrono::NaiveDateTime;

/// Which controls the display offers in its current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// The preset buttons, offered only in clock mode.
    pub show_presets: bool,
    /// The stop control, offered only in timer mode.
    pub show_stop: bool,
}

/// Everything needed to render one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    pub left: String,
    pub right: String,
    /// "AM"/"PM" in clock mode, the unit label in timer mode.
    pub ampm_or_label: String,
    /// The date in clock mode, the wall-clock time in timer mode.
    pub subtitle: String,
    pub is_timer_mode: bool,
    pub is_flashing: bool,
    pub controls: Controls,
}

/// Selects what to show for the given wall-clock time and countdown state.
pub fn select_display(now: &NaiveDateTime, timer: &TimerState) -> DisplayFrame {
    let clock = format_clock(now);
    let is_timer_mode = timer.is_timer_mode();
    let controls = Controls {
        show_presets: !is_timer_mode,
        show_stop: is_timer_mode,
    };

    if is_timer_mode {
        let parts = format_countdown(timer.remaining_seconds());
        DisplayFrame {
            left: parts.left,
            right: parts.right,
            ampm_or_label: parts.label.to_string(),
            subtitle: clock.to_string(),
            is_timer_mode,
            is_flashing: timer.is_flashing(),
            controls,
        }
    } else {
        DisplayFrame {
            subtitle: format_date(now),
            ampm_or_label: clock.ampm.as_str().to_string(),
            left: clock.hours12,
            right: clock.minutes,
            is_timer_mode,
            is_flashing: false,
            controls,
        }
    }
}
