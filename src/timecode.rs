/// Format a duration in seconds as zero-padded `HH:MM:SS`.
///
/// Input is truncated (not rounded) to whole seconds. Hours do not wrap at
/// 24, so long mixes keep counting upward. Negative input clamps to zero.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_all_zeros() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
    }

    #[test]
    fn splits_hours_minutes_seconds() {
        assert_eq!(format_timestamp(3661.0), "01:01:01");
        assert_eq!(format_timestamp(59.0), "00:00:59");
        assert_eq!(format_timestamp(86399.0), "23:59:59");
    }

    #[test]
    fn does_not_wrap_at_24_hours() {
        assert_eq!(format_timestamp(90000.0), "25:00:00");
    }

    #[test]
    fn truncates_fractional_seconds() {
        assert_eq!(format_timestamp(59.999), "00:00:59");
        assert_eq!(format_timestamp(60.001), "00:01:00");
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_eq!(format_timestamp(-5.0), "00:00:00");
    }
}
