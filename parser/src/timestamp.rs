//! Vendor timestamp decoding.
//!
//! The simple dialect prints checkout times without a year
//! (`Mon 3/2 8:15`), so the year is inferred from the reference clock. The
//! verbose dialect prints full dates (`Mon Mar 02 08:15:20 2020`) with
//! abbreviated or full English day and month names.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use regex::Regex;

static YEARLESS_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[A-Za-z]+\.?\s+)?(\d{1,2})/(\d{1,2})\s+(\d{1,2}):(\d{2})")
        .expect("static regex must compile")
});

/// Abbreviated month names first, then full ones.
const FULL_DATE_FORMATS: [&str; 2] = ["%b %d %H:%M:%S %Y", "%B %d %H:%M:%S %Y"];

/// Prefix the verbose dialect puts in front of a checkout time.
const RUNNING_SINCE: &str = "Running since";

/// Picks the year for a year-less `month` relative to `now`.
///
/// A month later than the current one can only be a session that started
/// before New Year, so it belongs to the previous year.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use license_monitor_parser::timestamp::infer_year;
///
/// let now = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// assert_eq!(infer_year(12, now), 2023);
/// assert_eq!(infer_year(1, now), 2024);
/// ```
pub fn infer_year(month: u32, now: NaiveDateTime) -> i32 {
    if month > now.month() {
        now.year() - 1
    } else {
        now.year()
    }
}

/// Parses a simple-dialect `start` timestamp such as `Mon 3/2 8:15`.
///
/// Trailing tokens after the time (`(linger: 300)`) are ignored. Returns
/// `None` when the text does not hold a valid month/day and time.
pub fn parse_yearless_start(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let caps = YEARLESS_START.captures(text)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;

    NaiveDate::from_ymd_opt(infer_year(month, now), month, day)?.and_hms_opt(hour, minute, 0)
}

/// Parses a verbose-dialect date such as `Thu Dec 31 23:59:59 2020`.
///
/// The leading day name is optional and not checked against the date.
pub fn parse_full_date(text: &str) -> Option<NaiveDateTime> {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    let starts_with_two_names = tokens.len() > 1
        && tokens[..2]
            .iter()
            .all(|token| token.chars().all(|ch| ch.is_ascii_alphabetic()));
    if starts_with_two_names {
        tokens.remove(0);
    }

    let normalized = tokens.join(" ");
    FULL_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
}

/// Parses a verbose-dialect `Status` value, e.g.
/// `Running since Mon Mar 02 08:15:20 2020`.
pub fn parse_running_since(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    parse_full_date(trimmed.strip_prefix(RUNNING_SINCE).unwrap_or(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now(year: i32, month: u32, day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ymd_hm(year: i32, month: u32, day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_yearless_start_same_year() {
        assert_eq!(
            parse_yearless_start("Mon 3/2 8:15", now(2024, 3, 4)),
            Some(ymd_hm(2024, 3, 2, 8, 15))
        );
    }

    #[test]
    fn test_yearless_start_wraps_over_new_year() {
        assert_eq!(
            parse_yearless_start("Tue 12/31 17:05", now(2025, 1, 2)),
            Some(ymd_hm(2024, 12, 31, 17, 5))
        );
    }

    #[test]
    fn test_yearless_start_ignores_trailing_tokens() {
        assert_eq!(
            parse_yearless_start("Fri 10/16 13:07 (linger: 1800)", now(2026, 10, 18)),
            Some(ymd_hm(2026, 10, 16, 13, 7))
        );
    }

    #[test]
    fn test_yearless_start_rejects_garbage() {
        assert_eq!(parse_yearless_start("soon", now(2024, 3, 4)), None);
        assert_eq!(parse_yearless_start("Mon 13/2 8:15", now(2024, 3, 4)), None);
        assert_eq!(parse_yearless_start("Mon 2/30 8:15", now(2024, 3, 4)), None);
    }

    #[test]
    fn test_full_date_with_and_without_day_name() {
        let expected = NaiveDate::from_ymd_opt(2020, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(parse_full_date("Thu Dec 31 23:59:59 2020"), Some(expected));
        assert_eq!(parse_full_date("Dec 31 23:59:59 2020"), Some(expected));
        assert_eq!(parse_full_date("Thursday December 31 23:59:59 2020"), Some(expected));
        assert_eq!(parse_full_date("Thu December 31 23:59:59 2020"), Some(expected));
        assert_eq!(parse_full_date("December 31 23:59:59 2020"), Some(expected));
    }

    #[test]
    fn test_full_date_tolerates_padding() {
        assert_eq!(
            parse_full_date("Mon Mar  2 08:15:20 2020"),
            Some(
                NaiveDate::from_ymd_opt(2020, 3, 2)
                    .unwrap()
                    .and_hms_opt(8, 15, 20)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_running_since() {
        assert_eq!(
            parse_running_since("Running since Mon Mar 02 08:15:20 2020"),
            parse_full_date("Mon Mar 02 08:15:20 2020")
        );
        assert_eq!(
            parse_running_since("Running since Monday March 02 08:15:20 2020"),
            parse_full_date("Mon Mar 02 08:15:20 2020")
        );
        assert!(parse_running_since("Running since Monday March 02 08:15:20 2020").is_some());
        assert!(parse_running_since("Running since whenever").is_none());
    }
}
