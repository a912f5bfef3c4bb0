//! Salary records, hourly rate and gross pay.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::time::WorkedTime;

/// Parameters for deriving an hourly rate from a monthly salary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateConfig {
    /// Default: 22.
    pub working_days_per_month: u32,
    /// Default: 8.
    pub working_hours_per_day: u32,
    /// Used when no valid monthly salary is set. Default: 20.00.
    pub default_hourly_rate: Decimal,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            working_days_per_month: 22,
            working_hours_per_day: 8,
            default_hourly_rate: Decimal::new(2000, 2),
        }
    }
}

impl RateConfig {
    /// Hourly rate for a monthly salary, rounded to cents.
    ///
    /// Falls back to the default rate for a missing, zero or negative salary
    /// and for a zero working-hours divisor. Never fails.
    pub fn hourly_rate(&self, monthly_salary: Option<Decimal>) -> Decimal {
        let Some(monthly) = monthly_salary.filter(|salary| *salary > Decimal::ZERO) else {
            return self.default_hourly_rate;
        };
        let hours_per_month = u64::from(self.working_days_per_month)
            * u64::from(self.working_hours_per_day);
        if hours_per_month == 0 {
            return self.default_hourly_rate;
        }
        monthly
            .checked_div(Decimal::from(hours_per_month))
            .map_or(self.default_hourly_rate, round_money)
    }
}

/// Rounds to two decimal places, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Pay for worked time at an hourly rate, rounded to cents. `None` when the
/// product overflows a decimal.
pub fn gross_pay(worked: WorkedTime, hourly_rate: Decimal) -> Option<Decimal> {
    worked.hours().checked_mul(hourly_rate).map(round_money)
}

/// Per-driver salary settings and accrued worked time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRecord {
    /// `None` means the default hourly rate applies.
    pub monthly_salary: Option<Decimal>,
    /// Always equal to the sum of `daily`.
    pub total_worked: WorkedTime,
    /// Worked time per business date, one entry per clocked-out day.
    pub daily: BTreeMap<NaiveDate, WorkedTime>,
}

impl SalaryRecord {
    /// Records a day's worked time, replacing any earlier value for the same
    /// date, and keeps the total equal to the sum of the days.
    pub fn record_day(&mut self, date: NaiveDate, worked: WorkedTime) {
        let previous = self.daily.insert(date, worked).unwrap_or(WorkedTime::ZERO);
        self.total_worked = self
            .total_worked
            .saturating_sub(previous)
            .saturating_add(worked);
    }

    pub fn total_hours(&self) -> Decimal {
        self.total_worked.hours()
    }

    /// Sum of the daily entries; equals `total_worked` for a consistent record.
    pub fn daily_sum(&self) -> WorkedTime {
        self.daily.values().copied().sum()
    }

    /// Worked time for dates accepted by `filter`.
    pub fn worked_where(&self, filter: impl Fn(NaiveDate) -> bool) -> WorkedTime {
        self.daily
            .iter()
            .filter(|(date, _)| filter(**date))
            .map(|(_, worked)| *worked)
            .sum()
    }
}
