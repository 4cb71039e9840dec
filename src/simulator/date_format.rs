//! Token substitution for date format expressions.

use chrono::{Datelike, NaiveDateTime, Timelike};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Leftmost-first alternation, so `YYYYY` is `YYYY` followed by a literal `Y`.
    static ref DATE_TOKEN: Regex = Regex::new("YYYY|MM|DD|HH|mm|ss|SSS").unwrap();
}

/// Format `datetime` by replacing the supported tokens in `format`.
///
/// Supported tokens: `YYYY`, `MM`, `DD`, `HH`, `mm`, `ss`, `SSS`. Everything
/// else in `format` is copied through untouched.
pub fn format_datetime(datetime: &NaiveDateTime, format: &str) -> String {
    DATE_TOKEN
        .replace_all(format, |caps: &Captures| match &caps[0] {
            "YYYY" => format!("{:04}", datetime.year()),
            "MM" => format!("{:02}", datetime.month()),
            "DD" => format!("{:02}", datetime.day()),
            "HH" => format!("{:02}", datetime.hour()),
            "mm" => format!("{:02}", datetime.minute()),
            "ss" => format!("{:02}", datetime.second()),
            // Leap seconds carry nanoseconds past 1e9
            "SSS" => format!("{:03}", (datetime.nanosecond() / 1_000_000) % 1000),
            other => other.to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_milli_opt(h, mi, s, ms)
            .unwrap()
    }

    #[test]
    fn test_date_only() {
        let dt = at(2024, 1, 5, 0, 0, 0, 0);
        assert_eq!(format_datetime(&dt, "YYYY-MM-DD"), "2024-01-05");
    }

    #[test]
    fn test_full_timestamp_with_millis() {
        let dt = at(2023, 11, 28, 7, 4, 9, 42);
        assert_eq!(
            format_datetime(&dt, "YYYY/MM/DD HH:mm:ss.SSS"),
            "2023/11/28 07:04:09.042"
        );
    }

    #[test]
    fn test_unknown_text_passes_through() {
        let dt = at(2024, 6, 1, 12, 30, 0, 0);
        assert_eq!(format_datetime(&dt, "Q1 of YYYY"), "Q1 of 2024");
        assert_eq!(format_datetime(&dt, "no tokens here"), "no tokens here");
    }

    #[test]
    fn test_tokens_do_not_partially_match() {
        let dt = at(2024, 6, 1, 12, 30, 45, 0);
        assert_eq!(format_datetime(&dt, "YYYYY"), "2024Y");
        assert_eq!(format_datetime(&dt, "M D Y"), "M D Y");
        assert_eq!(format_datetime(&dt, "MMM"), "06M");
    }

    #[test]
    fn test_case_distinguishes_month_and_minute() {
        let dt = at(2024, 2, 3, 4, 5, 6, 7);
        assert_eq!(format_datetime(&dt, "MM mm"), "02 05");
        assert_eq!(format_datetime(&dt, "ss SSS"), "06 007");
    }
}
