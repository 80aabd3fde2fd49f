//! Pure functions that turn timestamps and second counts into display text.

use chrono::{NaiveDateTime, Timelike};
use std::fmt;

/// Seconds at or above which a countdown is shown as hours and minutes.
pub const HOUR_DISPLAY_THRESHOLD: u32 = 3600;

pub const LABEL_HOURS_MINUTES: &str = "HR : MIN";
pub const LABEL_MINUTES_SECONDS: &str = "MIN : SEC";

/// Either half of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

/// A timestamp split into 12-hour clock parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockParts {
    /// "01" through "12".
    pub hours12: String,
    /// "00" through "59".
    pub minutes: String,
    pub ampm: Meridiem,
}

impl fmt::Display for ClockParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {}", self.hours12, self.minutes, self.ampm.as_str())
    }
}

/// Splits a timestamp into zero-padded 12-hour parts.
///
/// Midnight is "12" AM and noon is "12" PM.
pub fn format_clock(timestamp: &NaiveDateTime) -> ClockParts {
    let hour = timestamp.hour();
    let ampm = if hour >= 12 { Meridiem::Pm } else { Meridiem::Am };
    let hours12 = match hour % 12 {
        0 => 12,
        h => h,
    };
    ClockParts {
        hours12: format!("{:02}", hours12),
        minutes: format!("{:02}", timestamp.minute()),
        ampm,
    }
}

/// Renders the long-form date, e.g. "Sunday, October 18, 2026".
pub fn format_date(timestamp: &NaiveDateTime) -> String {
    timestamp.format("%A, %B %-d, %Y").to_string()
}

/// A remaining-seconds count split for the two cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownParts {
    pub left: String,
    pub right: String,
    pub label: &'static str,
}

/// Splits a countdown into hours/minutes when an hour or more remains,
/// otherwise into minutes/seconds.
pub fn format_countdown(remaining_seconds: u32) -> CountdownParts {
    let hours = remaining_seconds / 3600;
    let minutes = (remaining_seconds % 3600) / 60;
    let seconds = remaining_seconds % 60;

    if remaining_seconds >= HOUR_DISPLAY_THRESHOLD {
        CountdownParts {
            left: format!("{:02}", hours),
            right: format!("{:02}", minutes),
            label: LABEL_HOURS_MINUTES,
        }
    } else {
        CountdownParts {
            left: format!("{:02}", minutes),
            right: format!("{:02}", seconds),
            label: LABEL_MINUTES_SECONDS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_midnight_and_noon() {
        let midnight = format_clock(&at(0, 5));
        assert_eq!(midnight.hours12, "12");
        assert_eq!(midnight.minutes, "05");
        assert_eq!(midnight.ampm, Meridiem::Am);

        let noon = format_clock(&at(12, 0));
        assert_eq!(noon.hours12, "12");
        assert_eq!(noon.ampm, Meridiem::Pm);
    }

    #[test]
    fn test_every_hour_maps_into_twelve_hour_range() {
        for hour in 0..24 {
            let parts = format_clock(&at(hour, 30));
            let expected = if hour % 12 == 0 { 12 } else { hour % 12 };
            assert_eq!(parts.hours12, format!("{:02}", expected), "hour {}", hour);
            let expected_ampm = if hour < 12 { Meridiem::Am } else { Meridiem::Pm };
            assert_eq!(parts.ampm, expected_ampm, "hour {}", hour);
        }
    }

    #[test]
    fn test_clock_parts_display() {
        assert_eq!(format_clock(&at(14, 15)).to_string(), "02:15 PM");
        assert_eq!(format_clock(&at(11, 59)).to_string(), "11:59 AM");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&at(9, 0)), "Sunday, October 18, 2026");
        let new_year = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(format_date(&new_year), "Thursday, January 1, 2026");
    }

    #[test]
    fn test_countdown_label_boundary() {
        let hour = format_countdown(3600);
        assert_eq!((hour.left.as_str(), hour.right.as_str()), ("01", "00"));
        assert_eq!(hour.label, LABEL_HOURS_MINUTES);

        let below = format_countdown(3599);
        assert_eq!((below.left.as_str(), below.right.as_str()), ("59", "59"));
        assert_eq!(below.label, LABEL_MINUTES_SECONDS);
    }

    #[test]
    fn test_countdown_workday_and_zero() {
        let workday = format_countdown(480 * 60);
        assert_eq!((workday.left.as_str(), workday.right.as_str()), ("08", "00"));

        let done = format_countdown(0);
        assert_eq!((done.left.as_str(), done.right.as_str()), ("00", "00"));
        assert_eq!(done.label, LABEL_MINUTES_SECONDS);
    }
}
