//! Time argument helpers

use crate::domain::model::TimeSpec;

/// `clap` value parser for time arguments
pub fn parse_time_arg(value: &str) -> Result<TimeSpec, String> {
    TimeSpec::parse(value).map_err(|e| e.to_string())
}

/// Filename-safe timestamp: `HH-MM-SS`, with `.mmm` only when needed
pub fn format_time_tag(seconds: f64) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    if millis == 0 {
        format!("{:02}-{:02}-{:02}", hours, minutes, secs)
    } else {
        format!("{:02}-{:02}-{:02}.{:03}", hours, minutes, secs, millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time_tag() {
        assert_eq!(format_time_tag(0.0), "00-00-00");
        assert_eq!(format_time_tag(3725.0), "01-02-05");
        assert_eq!(format_time_tag(20.5), "00-00-20.500");
    }

    #[test]
    fn test_parse_time_arg() {
        assert_eq!(parse_time_arg("1:30").unwrap().as_seconds(), 90.0);
        assert!(parse_time_arg("soon").is_err());
    }
}
