//! Terminal rendering of a `DisplayFrame`.

use crate::common::Preset;
use crate::display::DisplayFrame;
use colored::Colorize;

/// Renders a frame as a small block of coloured terminal text.
///
/// Flashing frames draw the digits white on red.
pub fn render_frame(frame: &DisplayFrame) -> String {
    let digit = |text: &str| {
        let text = format!(" {} ", text);
        if frame.is_flashing {
            text.bold().white().on_red()
        } else {
            text.bold().white()
        }
    };
    let label = if frame.is_timer_mode {
        frame.ampm_or_label.cyan()
    } else {
        frame.ampm_or_label.normal()
    };
    let subtitle = if frame.is_timer_mode {
        frame.subtitle.cyan()
    } else {
        frame.subtitle.dimmed()
    };

    let mut lines = vec![
        "┌────┐ ┌────┐".to_string(),
        format!("│{}│ │{}│ {}", digit(&frame.left), digit(&frame.right), label),
        "└────┘ └────┘".to_string(),
        subtitle.to_string(),
    ];

    if frame.controls.show_presets {
        let presets: Vec<String> = Preset::ALL
            .iter()
            .map(|preset| format!("[{}]", preset.label()).yellow().to_string())
            .collect();
        lines.push(presets.join(" "));
    }
    if frame.controls.show_stop {
        lines.push("[x stop]".red().to_string());
    }
    lines.join("\n")
}
