/// `H:MM:SS` from one hour up, `MM:SS` below.
pub fn format_remaining(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// `H:MM` for a length in minutes.
pub fn format_minutes(minutes: u32) -> String {
    format!("{}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_switches_to_hours() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(1500), "25:00");
        assert_eq!(format_remaining(3599), "59:59");
        assert_eq!(format_remaining(3600), "1:00:00");
        assert_eq!(format_remaining(5025), "1:23:45");
    }

    #[test]
    fn minutes_as_hours_and_minutes() {
        assert_eq!(format_minutes(0), "0:00");
        assert_eq!(format_minutes(100), "1:40");
    }
}
