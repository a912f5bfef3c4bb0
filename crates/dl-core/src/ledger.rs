//! The ledger service: the operations exposed to command handlers.
//!
//! Every operation resolves "now" and "today" through the configured clock
//! and business calendar, validates its inputs, and performs exactly one
//! atomic store operation. There is no in-process cache; reads always go to
//! the store.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::{ClaimEntry, NewClaim, TopupEntry, checked_total};
use crate::attendance::{AttendanceRecord, decide_clock_in, decide_clock_out, decide_off_day};
use crate::error::LedgerError;
use crate::salary::{RateConfig, gross_pay};
use crate::store::LedgerStore;
use crate::summary::{ClaimPage, DriverClaim, DriverExport, DriverSummary, LedgerExport};
use crate::time::{BusinessCalendar, Clock, DateRange, SystemClock, WorkedTime, to_record_precision};
use crate::types::{AdminId, DriverId, DriverProfile, ValidationError, require_positive};

/// Business settings the ledger runs with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerSettings {
    pub calendar: BusinessCalendar,
    pub rates: RateConfig,
}

/// Result of a successful clock-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockInReceipt {
    pub date: NaiveDate,
    pub at: DateTime<Utc>,
}

/// Result of a successful clock-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockOutReceipt {
    pub date: NaiveDate,
    pub at: DateTime<Utc>,
    pub worked: WorkedTime,
    /// Worked time for display, e.g. `2Hour 15Min`.
    pub elapsed: String,
}

pub struct Ledger<S, C = SystemClock> {
    store: S,
    clock: C,
    settings: LedgerSettings,
}

impl<S: LedgerStore> Ledger<S, SystemClock> {
    pub const fn new(store: S, settings: LedgerSettings) -> Self {
        Self::with_clock(store, SystemClock, settings)
    }
}

impl<S: LedgerStore, C: Clock> Ledger<S, C> {
    pub const fn with_clock(store: S, clock: C, settings: LedgerSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub const fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// The current instant at record precision.
    pub fn now(&self) -> DateTime<Utc> {
        to_record_precision(self.clock.now())
    }

    /// Today's date in the business timezone.
    pub fn today(&self) -> NaiveDate {
        self.settings.calendar.date_of(self.now())
    }

    // ========== Attendance ==========

    pub fn clock_in(&mut self, driver: &DriverId) -> Result<ClockInReceipt, LedgerError> {
        let now = self.now();
        self.clock_in_at(driver, now)
    }

    pub fn clock_in_at(
        &mut self,
        driver: &DriverId,
        now: DateTime<Utc>,
    ) -> Result<ClockInReceipt, LedgerError> {
        let at = to_record_precision(now);
        let date = self.settings.calendar.date_of(at);
        self.store
            .transition_attendance(driver, date, |existing| decide_clock_in(existing, date, at))?;
        tracing::info!(%driver, %date, %at, "clocked in");
        Ok(ClockInReceipt { date, at })
    }

    pub fn clock_out(&mut self, driver: &DriverId) -> Result<ClockOutReceipt, LedgerError> {
        let now = self.now();
        self.clock_out_at(driver, now)
    }

    /// Closes today's shift and accrues the worked time.
    ///
    /// A clock-out earlier than the clock-in is accepted using the absolute
    /// difference and logged as a clock anomaly.
    pub fn clock_out_at(
        &mut self,
        driver: &DriverId,
        now: DateTime<Utc>,
    ) -> Result<ClockOutReceipt, LedgerError> {
        let at = to_record_precision(now);
        let date = self.settings.calendar.date_of(at);
        let change = self
            .store
            .transition_attendance(driver, date, |existing| decide_clock_out(existing, date, at))?;
        let elapsed = change.accrue.unwrap_or_default();
        if elapsed.skewed {
            tracing::warn!(
                %driver,
                %date,
                clock_in = %change.record.clock_in(),
                clock_out = %at,
                "clock-out precedes clock-in; using absolute elapsed time"
            );
        }
        tracing::info!(%driver, %date, %at, worked_seconds = elapsed.worked.seconds(), "clocked out");
        Ok(ClockOutReceipt {
            date,
            at,
            worked: elapsed.worked,
            elapsed: elapsed.worked.to_string(),
        })
    }

    /// Marks `date` as an off day. Marking an off day twice is a no-op.
    pub fn mark_off_day(&mut self, driver: &DriverId, date: NaiveDate) -> Result<(), LedgerError> {
        let change = self
            .store
            .transition_attendance(driver, date, |existing| decide_off_day(existing, date))?;
        if !change.unchanged {
            tracing::info!(%driver, %date, "marked off day");
        }
        Ok(())
    }

    pub fn mark_off_today(&mut self, driver: &DriverId) -> Result<NaiveDate, LedgerError> {
        let today = self.today();
        self.mark_off_day(driver, today)?;
        Ok(today)
    }

    pub fn attendance(
        &self,
        driver: &DriverId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, LedgerError> {
        Ok(self.store.attendance(driver, date)?)
    }

    /// The latest `limit` attendance records, newest first.
    pub fn recent_attendance(
        &self,
        driver: &DriverId,
        limit: usize,
    ) -> Result<Vec<AttendanceRecord>, LedgerError> {
        let records = self.store.attendance_in(driver, DateRange::all())?;
        Ok(records.into_iter().rev().take(limit).collect())
    }

    // ========== Account ==========

    /// Records a claim and debits the driver's balance. Returns the new
    /// balance, which may be negative.
    pub fn submit_claim(
        &mut self,
        driver: &DriverId,
        claim: NewClaim,
    ) -> Result<Decimal, LedgerError> {
        let entry = claim.into_entry()?;
        let balance = self.store.append_claim(driver, &entry)?;
        tracing::info!(
            %driver,
            claim_id = %entry.id,
            category = %entry.category,
            amount = %entry.amount,
            %balance,
            "claim recorded"
        );
        Ok(balance)
    }

    /// Credits the driver's balance. The caller must have checked that
    /// `initiated_by` is privileged.
    pub fn topup(
        &mut self,
        driver: &DriverId,
        amount: Decimal,
        date: NaiveDate,
        initiated_by: &AdminId,
    ) -> Result<Decimal, LedgerError> {
        let entry = TopupEntry::new(amount, date, initiated_by.clone())?;
        let balance = self.store.append_topup(driver, &entry)?;
        tracing::info!(
            %driver,
            admin = %initiated_by,
            topup_id = %entry.id,
            amount = %entry.amount,
            %balance,
            "balance topped up"
        );
        Ok(balance)
    }

    pub fn topup_today(
        &mut self,
        driver: &DriverId,
        amount: Decimal,
        initiated_by: &AdminId,
    ) -> Result<Decimal, LedgerError> {
        let today = self.today();
        self.topup(driver, amount, today, initiated_by)
    }

    /// Current balance; zero for a driver with no account.
    pub fn balance(&self, driver: &DriverId) -> Result<Decimal, LedgerError> {
        Ok(self.store.balance(driver)?.unwrap_or_default())
    }

    /// Balances of every account, with driver profiles for display.
    pub fn balances(&self) -> Result<Vec<(DriverProfile, Decimal)>, LedgerError> {
        let balances = self.store.balances()?;
        let mut result = Vec::with_capacity(balances.len());
        for (driver, balance) in balances {
            let profile = self
                .store
                .driver(&driver)?
                .unwrap_or_else(|| DriverProfile::new(driver));
            result.push((profile, balance));
        }
        Ok(result)
    }

    /// One page of claim history, newest first. `page` is 1-based.
    pub fn claims_page(
        &self,
        driver: Option<&DriverId>,
        page: usize,
        per_page: usize,
    ) -> Result<ClaimPage, LedgerError> {
        let drivers = match driver {
            Some(driver) => vec![driver.clone()],
            None => self.store.drivers()?.into_iter().map(|p| p.id).collect(),
        };
        let mut claims: Vec<DriverClaim> = Vec::new();
        for driver in drivers {
            if let Some(account) = self.store.account(&driver)? {
                claims.extend(account.claims.into_iter().rev().map(|claim| DriverClaim {
                    driver: driver.clone(),
                    claim,
                }));
            }
        }
        // Stable sort keeps newest-first order within a date.
        claims.sort_by(|a, b| b.claim.date.cmp(&a.claim.date));
        Ok(ClaimPage::paginate(claims, page, per_page))
    }

    // ========== Salary ==========

    /// Sets a driver's monthly salary and returns the resulting hourly rate.
    pub fn set_monthly_salary(
        &mut self,
        driver: &DriverId,
        monthly_salary: Decimal,
    ) -> Result<Decimal, LedgerError> {
        let monthly_salary = require_positive(monthly_salary)?;
        let record = self.store.set_monthly_salary(driver, monthly_salary)?;
        let rate = self.settings.rates.hourly_rate(record.monthly_salary);
        tracing::info!(%driver, %monthly_salary, hourly_rate = %rate, "monthly salary set");
        Ok(rate)
    }

    pub fn hourly_rate(&self, driver: &DriverId) -> Result<Decimal, LedgerError> {
        let monthly = self
            .store
            .salary(driver)?
            .and_then(|salary| salary.monthly_salary);
        Ok(self.settings.rates.hourly_rate(monthly))
    }

    /// Accrued hours times the hourly rate. Derived, never stored.
    pub fn gross_pay(&self, driver: &DriverId) -> Result<Decimal, LedgerError> {
        let salary = self.store.salary(driver)?.unwrap_or_default();
        let rate = self.settings.rates.hourly_rate(salary.monthly_salary);
        Ok(pay_for(salary.total_worked, rate)?)
    }

    // ========== Drivers and reports ==========

    pub fn register_driver(&mut self, profile: &DriverProfile) -> Result<(), LedgerError> {
        self.store.register_driver(profile)?;
        tracing::debug!(driver = %profile.id, "driver registered");
        Ok(())
    }

    pub fn driver(&self, driver: &DriverId) -> Result<DriverProfile, LedgerError> {
        Ok(self
            .store
            .driver(driver)?
            .unwrap_or_else(|| DriverProfile::new(driver.clone())))
    }

    pub fn drivers(&self) -> Result<Vec<DriverProfile>, LedgerError> {
        Ok(self.store.drivers()?)
    }

    /// Read-only aggregate of one driver's records within `range`.
    pub fn driver_summary(
        &self,
        driver: &DriverId,
        range: DateRange,
    ) -> Result<DriverSummary, LedgerError> {
        let profile = self.driver(driver)?;
        let attendance = self.store.attendance_in(driver, range)?;
        let salary = self.store.salary(driver)?.unwrap_or_default();
        let account = self.store.account(driver)?.unwrap_or_default();
        let hourly_rate = self.settings.rates.hourly_rate(salary.monthly_salary);
        let worked_in_range = salary.worked_where(|date| range.contains(date));

        let claims: Vec<ClaimEntry> = account
            .claims
            .into_iter()
            .filter(|claim| range.contains(claim.date))
            .collect();
        let topups: Vec<TopupEntry> = account
            .topups
            .into_iter()
            .filter(|topup| range.contains(topup.date))
            .collect();

        Ok(DriverSummary {
            driver: profile,
            range,
            claimed_in_range: checked_total(claims.iter().map(|c| c.amount))
                .ok_or(ValidationError::TotalOutOfRange { what: "claimed total" })?,
            topped_up_in_range: checked_total(topups.iter().map(|t| t.amount))
                .ok_or(ValidationError::TotalOutOfRange { what: "top-up total" })?,
            attendance,
            claims,
            topups,
            monthly_salary: salary.monthly_salary,
            hourly_rate,
            total_hours: salary.total_hours(),
            gross_pay: pay_for(salary.total_worked, hourly_rate)?,
            hours_in_range: worked_in_range.hours(),
            pay_in_range: pay_for(worked_in_range, hourly_rate)?,
            balance: account.balance,
        })
    }

    /// A snapshot of every driver's records.
    pub fn export(&self) -> Result<LedgerExport, LedgerError> {
        let mut drivers = Vec::new();
        for profile in self.store.drivers()? {
            let attendance = self.store.attendance_in(&profile.id, DateRange::all())?;
            let salary = self.store.salary(&profile.id)?;
            let account = self.store.account(&profile.id)?;
            drivers.push(DriverExport {
                profile,
                attendance,
                salary,
                account,
            });
        }
        Ok(LedgerExport {
            generated_at: self.now(),
            timezone: self.settings.calendar.timezone().name().to_string(),
            drivers,
        })
    }
}

fn pay_for(worked: WorkedTime, hourly_rate: Decimal) -> Result<Decimal, ValidationError> {
    gross_pay(worked, hourly_rate).ok_or(ValidationError::TotalOutOfRange { what: "gross pay" })
}
