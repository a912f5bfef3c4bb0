//! The persistence seam.
//!
//! A [`LedgerStore`] is the single source of truth for attendance, salary and
//! account records. Each mutating method is one atomic operation: either all
//! of its effects are durable or none are. Implementations must never split
//! a history append from its balance delta, or a clock-out from its salary
//! accrual.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::account::{AccountRecord, ClaimEntry, TopupEntry};
use crate::attendance::{AttendanceChange, AttendanceRecord};
use crate::error::{AttendanceError, LedgerError, StoreError};
use crate::salary::SalaryRecord;
use crate::time::DateRange;
use crate::types::{DriverId, DriverProfile};

pub trait LedgerStore {
    /// Creates or updates a driver's profile.
    fn register_driver(&mut self, profile: &DriverProfile) -> Result<(), StoreError>;

    fn driver(&self, driver: &DriverId) -> Result<Option<DriverProfile>, StoreError>;

    /// Every driver the store has seen, ordered by id.
    ///
    /// Drivers are recorded implicitly by any mutation that touches them.
    fn drivers(&self) -> Result<Vec<DriverProfile>, StoreError>;

    fn attendance(
        &self,
        driver: &DriverId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Attendance records within `range`, oldest first.
    fn attendance_in(
        &self,
        driver: &DriverId,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Atomically reads the driver's record for `date`, passes it to
    /// `decide`, and persists the returned change.
    ///
    /// When the change carries worked time, the salary record's daily entry
    /// and total are updated in the same atomic operation. A change marked
    /// `unchanged` is returned without writing. If `decide` refuses, nothing
    /// is written.
    fn transition_attendance<F>(
        &mut self,
        driver: &DriverId,
        date: NaiveDate,
        decide: F,
    ) -> Result<AttendanceChange, LedgerError>
    where
        F: FnOnce(Option<&AttendanceRecord>) -> Result<AttendanceChange, AttendanceError>;

    fn salary(&self, driver: &DriverId) -> Result<Option<SalaryRecord>, StoreError>;

    /// Sets the monthly salary, creating the salary record if needed.
    fn set_monthly_salary(
        &mut self,
        driver: &DriverId,
        monthly_salary: Decimal,
    ) -> Result<SalaryRecord, StoreError>;

    fn account(&self, driver: &DriverId) -> Result<Option<AccountRecord>, StoreError>;

    /// The cached balance, without loading history.
    fn balance(&self, driver: &DriverId) -> Result<Option<Decimal>, StoreError> {
        Ok(self.account(driver)?.map(|account| account.balance))
    }

    /// Balances of every account, ordered by driver id.
    fn balances(&self) -> Result<Vec<(DriverId, Decimal)>, StoreError>;

    /// Appends a claim and debits the balance atomically. Returns the new
    /// balance.
    ///
    /// The entry goes through [`AccountRecord::apply_claim`] against the
    /// current account; if that refuses, nothing is written.
    fn append_claim(&mut self, driver: &DriverId, claim: &ClaimEntry)
    -> Result<Decimal, LedgerError>;

    /// Appends a top-up and credits the balance atomically. Returns the new
    /// balance.
    ///
    /// Checked with [`AccountRecord::apply_topup`] like claims are.
    fn append_topup(&mut self, driver: &DriverId, topup: &TopupEntry)
    -> Result<Decimal, LedgerError>;
}
