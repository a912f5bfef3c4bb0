//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::Context;
use chrono::{Days, NaiveDate};
use dl_core::{AdminId, DateRange, DriverId, salary::round_money};
use regex::Regex;
use rust_decimal::Decimal;

/// Pre-compiled regex for relative date parsing.
static RELATIVE_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(day|week)s?\s+ago$").expect("relative date pattern is valid")
});

/// Conservative bound for relative dates (~100 years in days).
const MAX_RELATIVE_DAYS: u64 = 100 * 366;

/// Parse a date string as either `YYYY-MM-DD` or relative to `today`.
///
/// Supports:
/// - ISO dates: "2025-03-03"
/// - Keywords: "today", "yesterday"
/// - Relative: "3 days ago", "1 week ago"
pub fn parse_date(s: &str, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    match s.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "yesterday" => return days_before(today, 1),
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    let Some(caps) = RELATIVE_DATE_RE.captures(s) else {
        anyhow::bail!(
            "Invalid date: {s}. Use YYYY-MM-DD (e.g., 2025-03-03), 'today', 'yesterday' or relative (e.g., '3 days ago')"
        );
    };

    let n: u64 = caps[1]
        .parse()
        .context("failed to parse number in relative date")?;
    let days = match &caps[2] {
        "day" => n,
        "week" => n.saturating_mul(7),
        unit => anyhow::bail!("Unknown date unit: {unit}"),
    };
    if days > MAX_RELATIVE_DAYS {
        anyhow::bail!("Relative date too far back: {s}");
    }
    days_before(today, days)
}

fn days_before(today: NaiveDate, days: u64) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(days))
        .with_context(|| format!("{days} days before {today} is out of range"))
}

/// Parse `YYYY-MM` into the range covering that month.
pub fn parse_month(s: &str) -> anyhow::Result<DateRange> {
    let first = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month: {s}. Use YYYY-MM (e.g., 2025-03)"))?;
    Ok(DateRange::month_of(first))
}

/// Clap value parser for driver identifiers.
pub fn parse_driver_id(s: &str) -> Result<DriverId, dl_core::ValidationError> {
    DriverId::new(s.trim())
}

/// Clap value parser for admin identifiers.
pub fn parse_admin_id(s: &str) -> Result<AdminId, dl_core::ValidationError> {
    AdminId::new(s.trim())
}

/// Renders an amount with exactly two decimal places.
pub fn format_money(amount: Decimal) -> String {
    format!("{:.2}", round_money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        let date = parse_date("2025-02-28", today()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_date("today", today()).unwrap(), today());
        assert_eq!(
            parse_date("Yesterday", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_parse_relative_days_and_weeks() {
        assert_eq!(
            parse_date("3 days ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
        );
        assert_eq!(
            parse_date("1 day ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
        assert_eq!(
            parse_date("2 weeks ago", today()).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 24).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid_date() {
        let err = parse_date("next tuesday", today()).unwrap_err();
        assert!(err.to_string().contains("Invalid date"));
        assert!(parse_date("2025-02-30", today()).is_err());
    }

    #[test]
    fn test_parse_relative_too_far_back() {
        let err = parse_date("99999 days ago", today()).unwrap_err();
        assert!(err.to_string().contains("too far back"));
    }

    #[test]
    fn test_parse_month() {
        let range = parse_month("2024-02").unwrap();
        assert_eq!(range.start(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(range.end(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn test_format_money_pads_cents() {
        assert_eq!(format_money(dec!(50)), "50.00");
        assert_eq!(format_money(dec!(-7.5)), "-7.50");
        assert_eq!(format_money(dec!(19.885)), "19.89");
    }
}
