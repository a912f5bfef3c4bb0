//! Read-only report shapes built by the ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::{AccountRecord, ClaimEntry, TopupEntry};
use crate::attendance::{AttendanceRecord, ClockMark};
use crate::salary::SalaryRecord;
use crate::time::DateRange;
use crate::types::{DriverId, DriverProfile};

/// One driver's records and derived figures for a date range.
///
/// `total_hours`, `gross_pay` and `balance` are lifetime figures; the
/// `*_in_range` fields only count entries dated inside `range`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverSummary {
    pub driver: DriverProfile,
    pub range: DateRange,
    /// Oldest first.
    pub attendance: Vec<AttendanceRecord>,
    pub claims: Vec<ClaimEntry>,
    pub topups: Vec<TopupEntry>,
    pub monthly_salary: Option<Decimal>,
    pub hourly_rate: Decimal,
    pub total_hours: Decimal,
    pub gross_pay: Decimal,
    pub hours_in_range: Decimal,
    pub pay_in_range: Decimal,
    pub claimed_in_range: Decimal,
    pub topped_up_in_range: Decimal,
    pub balance: Decimal,
}

impl DriverSummary {
    pub fn days_worked(&self) -> usize {
        self.attendance
            .iter()
            .filter(|record| record.worked().is_some())
            .count()
    }

    pub fn days_off(&self) -> usize {
        self.attendance
            .iter()
            .filter(|record| record.clock_in() == ClockMark::Off)
            .count()
    }
}

/// A claim together with the driver who filed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverClaim {
    pub driver: DriverId,
    #[serde(flatten)]
    pub claim: ClaimEntry,
}

/// One page of claim history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimPage {
    /// 1-based.
    pub page: usize,
    pub per_page: usize,
    pub total_claims: usize,
    pub total_pages: usize,
    pub claims: Vec<DriverClaim>,
}

impl ClaimPage {
    /// Cuts `page` out of `claims`. A page past the end is empty; page 0 is
    /// treated as page 1.
    pub fn paginate(claims: Vec<DriverClaim>, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_claims = claims.len();
        let total_pages = total_claims.div_ceil(per_page).max(1);
        let claims = claims
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            page,
            per_page,
            total_claims,
            total_pages,
            claims,
        }
    }

    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverExport {
    pub profile: DriverProfile,
    pub attendance: Vec<AttendanceRecord>,
    pub salary: Option<SalaryRecord>,
    pub account: Option<AccountRecord>,
}

/// Full snapshot of the ledger, for backups and offline review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerExport {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub drivers: Vec<DriverExport>,
}
