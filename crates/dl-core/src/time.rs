//! Business time, elapsed-duration and calendar helpers.
//!
//! Every business decision that depends on "today" goes through a single
//! [`BusinessCalendar`] bound to one timezone, so clock-in, clock-out and
//! date bucketing always agree on the date. Wall-clock reads go through the
//! [`Clock`] trait so tests can pin "now".

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, SubsecRound, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

const SECONDS_PER_HOUR: i64 = 3600;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Maps instants onto the business timezone's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    tz: Tz,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Kuala_Lumpur)
    }
}

impl BusinessCalendar {
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// The business date an instant falls on.
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.tz).date_naive()
    }

    pub fn local(&self, at: DateTime<Utc>) -> DateTime<Tz> {
        at.with_timezone(&self.tz)
    }

    /// Local wall-clock rendering without seconds or offset, e.g. `2025-03-01 08:30`.
    pub fn format_local(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Truncates an instant to whole seconds, the precision attendance is kept at.
pub fn to_record_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(0)
}

/// A non-negative amount of worked time, kept as whole seconds.
///
/// Totals are sums of whole seconds, so they always equal the sum of their
/// parts exactly. Hours are derived on demand.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WorkedTime(i64);

impl WorkedTime {
    pub const ZERO: Self = Self(0);

    /// Clamps negative input to zero.
    pub const fn from_seconds(seconds: i64) -> Self {
        if seconds < 0 { Self(0) } else { Self(seconds) }
    }

    pub const fn seconds(self) -> i64 {
        self.0
    }

    /// Fractional hours, e.g. 2h15m is `2.25`.
    pub fn hours(self) -> Decimal {
        Decimal::from(self.0) / Decimal::from(SECONDS_PER_HOUR)
    }

    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::from_seconds(self.0.saturating_sub(other.0))
    }
}

impl std::iter::Sum for WorkedTime {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

impl fmt::Display for WorkedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minutes(self.0 / 60))
    }
}

/// Time between two instants, normalized to be non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elapsed {
    pub worked: WorkedTime,
    /// `end` was before `start`; the absolute difference was used.
    pub skewed: bool,
}

pub fn elapsed_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Elapsed {
    let seconds = end.signed_duration_since(start).num_seconds();
    Elapsed {
        worked: WorkedTime::from_seconds(seconds.saturating_abs()),
        skewed: seconds < 0,
    }
}

/// Formats fractional hours as `"<H>Hour <M>Min"`, `"<H>Hour"` or `"<M>Min"`.
///
/// Truncates to whole minutes, never rounding up. Non-positive input, and
/// input too large to count in minutes, renders as `"0Min"`.
pub fn format_hours(hours: Decimal) -> String {
    let minutes = hours
        .checked_mul(Decimal::from(60))
        .and_then(|minutes| minutes.trunc().to_i64())
        .unwrap_or(0);
    format_minutes(minutes)
}

fn format_minutes(total_minutes: i64) -> String {
    let total_minutes = total_minutes.max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (0, m) => format!("{m}Min"),
        (h, 0) => format!("{h}Hour"),
        (h, m) => format!("{h}Hour {m}Min"),
    }
}

/// An inclusive range of business dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub const fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Every date, for unbounded queries.
    pub const fn all() -> Self {
        Self {
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
        }
    }

    /// First through last day of the month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = date - Days::new(u64::from(date.day0()));
        let end = start
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_hours_and_minutes() {
        assert_eq!(format_hours(dec!(2.25)), "2Hour 15Min");
    }

    #[test]
    fn test_format_whole_hours() {
        assert_eq!(format_hours(dec!(8)), "8Hour");
    }

    #[test]
    fn test_format_minutes_only() {
        assert_eq!(format_hours(dec!(0.5)), "30Min");
    }

    #[test]
    fn test_format_truncates_partial_minute() {
        // 59.99 minutes stays 59
        assert_eq!(format_hours(dec!(0.99983)), "59Min");
        assert_eq!(format_hours(dec!(1.9999)), "1Hour 59Min");
    }

    #[test]
    fn test_format_zero_negative_and_out_of_range() {
        assert_eq!(format_hours(Decimal::ZERO), "0Min");
        assert_eq!(format_hours(dec!(-3)), "0Min");
        assert_eq!(format_hours(Decimal::MAX), "0Min");
        assert_eq!(format_hours(Decimal::MIN), "0Min");
    }

    #[test]
    fn test_worked_time_hours_are_exact() {
        let worked = WorkedTime::from_seconds(2 * 3600 + 15 * 60);
        assert_eq!(worked.hours(), dec!(2.25));
        assert_eq!(worked.to_string(), "2Hour 15Min");
    }

    #[test]
    fn test_worked_time_clamps_negative() {
        assert_eq!(WorkedTime::from_seconds(-10), WorkedTime::ZERO);
        let a = WorkedTime::from_seconds(10);
        let b = WorkedTime::from_seconds(30);
        assert_eq!(a.saturating_sub(b), WorkedTime::ZERO);
    }

    #[test]
    fn test_elapsed_normalizes_skew() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();

        let forward = elapsed_between(end, start);
        assert_eq!(forward.worked.seconds(), 3600);
        assert!(!forward.skewed);

        let backward = elapsed_between(start, end);
        assert_eq!(backward.worked.seconds(), 3600);
        assert!(backward.skewed);
    }

    #[test]
    fn test_business_date_uses_configured_zone() {
        // 17:30 UTC is 01:30 the next day in Kuala Lumpur (UTC+8).
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 17, 30, 0).unwrap();
        let calendar = BusinessCalendar::default();
        assert_eq!(calendar.date_of(at), date(2025, 3, 2));
        assert_eq!(calendar.format_local(at), "2025-03-02 01:30");

        let utc = BusinessCalendar::new(chrono_tz::UTC);
        assert_eq!(utc.date_of(at), date(2025, 3, 1));
    }

    #[test]
    fn test_record_precision_drops_subseconds() {
        let at = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        assert_eq!(to_record_precision(at).timestamp_subsec_nanos(), 0);
        assert_eq!(to_record_precision(at).timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_month_range() {
        let range = DateRange::month_of(date(2024, 2, 17));
        assert_eq!(range.start(), date(2024, 2, 1));
        assert_eq!(range.end(), date(2024, 2, 29));

        let december = DateRange::month_of(date(2025, 12, 31));
        assert_eq!(december.start(), date(2025, 12, 1));
        assert_eq!(december.end(), date(2025, 12, 31));
    }

    #[test]
    fn test_date_range_rejects_inverted_bounds() {
        let err = DateRange::new(date(2025, 3, 2), date(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
        let range = DateRange::new(date(2025, 3, 1), date(2025, 3, 1)).unwrap();
        assert!(range.contains(date(2025, 3, 1)));
        assert!(!range.contains(date(2025, 3, 2)));
    }

    #[test]
    fn test_fixed_clock_advances() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        clock.advance(chrono::Duration::minutes(90));
        assert_eq!(clock.now(), start + chrono::Duration::minutes(90));
    }
}
