//! Human-readable time formatting
//!
//! Clock labels for the player controls (`m:ss`, or `h:mm:ss` for
//! whole-section recordings that run past an hour).

const SECONDS_PER_HOUR: u64 = 3600;

/// Format a playback position in seconds as a clock label.
///
/// Non-finite and negative inputs render as `0:00`, matching how an audio
/// element reports an unknown duration.
///
/// # Examples
///
/// ```
/// use tilawa_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0.0), "0:00");
/// assert_eq!(format_clock(5.9), "0:05");
/// assert_eq!(format_clock(100.0), "1:40");
/// assert_eq!(format_clock(3725.0), "1:02:05");
/// assert_eq!(format_clock(f64::NAN), "0:00");
/// ```
pub fn format_clock(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let total = seconds.floor() as u64;
    let hours = total / SECONDS_PER_HOUR;
    let minutes = (total % SECONDS_PER_HOUR) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_minute() {
        assert_eq!(format_clock(0.4), "0:00");
        assert_eq!(format_clock(59.99), "0:59");
    }

    #[test]
    fn test_minutes() {
        assert_eq!(format_clock(60.0), "1:00");
        assert_eq!(format_clock(599.0), "9:59");
        assert_eq!(format_clock(3599.0), "59:59");
    }

    #[test]
    fn test_hours() {
        assert_eq!(format_clock(3600.0), "1:00:00");
        assert_eq!(format_clock(7384.2), "2:03:04");
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(format_clock(-3.0), "0:00");
        assert_eq!(format_clock(f64::INFINITY), "0:00");
        assert_eq!(format_clock(f64::NAN), "0:00");
    }
}
