//! In-memory [`LedgerStore`].
//!
//! Each mutation works on a copy of the driver's records and commits by
//! replacing the original, so a failure part-way leaves nothing behind.
//! Useful for tests and for embedding the ledger without a database.
//!
//! Not synchronized: share it across threads through a `Mutex`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::account::{AccountRecord, ClaimEntry, TopupEntry};
use crate::attendance::{AttendanceChange, AttendanceRecord};
use crate::error::{AttendanceError, LedgerError, StoreError};
use crate::salary::SalaryRecord;
use crate::store::LedgerStore;
use crate::time::DateRange;
use crate::types::{DriverId, DriverProfile};

#[derive(Debug, Clone)]
struct DriverBook {
    profile: DriverProfile,
    attendance: BTreeMap<NaiveDate, AttendanceRecord>,
    salary: Option<SalaryRecord>,
    account: Option<AccountRecord>,
}

impl DriverBook {
    fn new(driver: &DriverId) -> Self {
        Self {
            profile: DriverProfile::new(driver.clone()),
            attendance: BTreeMap::new(),
            salary: None,
            account: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    books: BTreeMap<DriverId, DriverBook>,
    failing_commits: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` commits fail after their changes were staged.
    pub const fn fail_next_commits(&mut self, count: usize) {
        self.failing_commits = count;
    }

    fn book(&self, driver: &DriverId) -> Option<&DriverBook> {
        self.books.get(driver)
    }

    /// Stages a change on a copy of the driver's book and commits it.
    fn commit<T>(
        &mut self,
        driver: &DriverId,
        change: impl FnOnce(&mut DriverBook) -> T,
    ) -> Result<T, StoreError> {
        self.try_commit(driver, |book| Ok(change(book)))
    }

    /// Like [`commit`](Self::commit), but a change that fails is discarded
    /// along with its copy.
    fn try_commit<T, E: From<StoreError>>(
        &mut self,
        driver: &DriverId,
        change: impl FnOnce(&mut DriverBook) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut staged = self
            .books
            .get(driver)
            .cloned()
            .unwrap_or_else(|| DriverBook::new(driver));
        let output = change(&mut staged)?;
        if self.failing_commits > 0 {
            self.failing_commits -= 1;
            return Err(StoreError::new("injected commit failure").into());
        }
        self.books.insert(driver.clone(), staged);
        Ok(output)
    }
}

impl LedgerStore for MemoryStore {
    fn register_driver(&mut self, profile: &DriverProfile) -> Result<(), StoreError> {
        self.commit(&profile.id, |book| book.profile = profile.clone())
    }

    fn driver(&self, driver: &DriverId) -> Result<Option<DriverProfile>, StoreError> {
        Ok(self.book(driver).map(|book| book.profile.clone()))
    }

    fn drivers(&self) -> Result<Vec<DriverProfile>, StoreError> {
        Ok(self.books.values().map(|book| book.profile.clone()).collect())
    }

    fn attendance(
        &self,
        driver: &DriverId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .book(driver)
            .and_then(|book| book.attendance.get(&date).copied()))
    }

    fn attendance_in(
        &self,
        driver: &DriverId,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.book(driver).map_or_else(Vec::new, |book| {
            book.attendance
                .range(range.start()..=range.end())
                .map(|(_, record)| *record)
                .collect()
        }))
    }

    fn transition_attendance<F>(
        &mut self,
        driver: &DriverId,
        date: NaiveDate,
        decide: F,
    ) -> Result<AttendanceChange, LedgerError>
    where
        F: FnOnce(Option<&AttendanceRecord>) -> Result<AttendanceChange, AttendanceError>,
    {
        let existing = self.attendance(driver, date)?;
        let change = decide(existing.as_ref())?;
        if change.unchanged {
            return Ok(change);
        }
        self.commit(driver, |book| {
            book.attendance.insert(date, change.record);
            if let Some(elapsed) = change.accrue {
                book.salary
                    .get_or_insert_with(SalaryRecord::default)
                    .record_day(date, elapsed.worked);
            }
        })?;
        Ok(change)
    }

    fn salary(&self, driver: &DriverId) -> Result<Option<SalaryRecord>, StoreError> {
        Ok(self.book(driver).and_then(|book| book.salary.clone()))
    }

    fn set_monthly_salary(
        &mut self,
        driver: &DriverId,
        monthly_salary: Decimal,
    ) -> Result<SalaryRecord, StoreError> {
        self.commit(driver, |book| {
            let salary = book.salary.get_or_insert_with(SalaryRecord::default);
            salary.monthly_salary = Some(monthly_salary);
            salary.clone()
        })
    }

    fn account(&self, driver: &DriverId) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.book(driver).and_then(|book| book.account.clone()))
    }

    fn balances(&self) -> Result<Vec<(DriverId, Decimal)>, StoreError> {
        Ok(self
            .books
            .iter()
            .filter_map(|(id, book)| {
                book.account
                    .as_ref()
                    .map(|account| (id.clone(), account.balance))
            })
            .collect())
    }

    fn append_claim(
        &mut self,
        driver: &DriverId,
        claim: &ClaimEntry,
    ) -> Result<Decimal, LedgerError> {
        self.try_commit(driver, |book| {
            Ok(book
                .account
                .get_or_insert_with(AccountRecord::default)
                .apply_claim(claim.clone())?)
        })
    }

    fn append_topup(
        &mut self,
        driver: &DriverId,
        topup: &TopupEntry,
    ) -> Result<Decimal, LedgerError> {
        self.try_commit(driver, |book| {
            Ok(book
                .account
                .get_or_insert_with(AccountRecord::default)
                .apply_topup(topup.clone())?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance;

    #[test]
    fn conforms_to_store_contract() {
        conformance::run_all(MemoryStore::new);
    }

    #[test]
    fn injected_failure_rolls_back_claim() {
        conformance::claim_failure_leaves_account_unchanged(MemoryStore::new(), |store| {
            store.fail_next_commits(1);
        });
    }

    #[test]
    fn injected_failure_rolls_back_topup() {
        conformance::topup_failure_leaves_account_unchanged(MemoryStore::new(), |store| {
            store.fail_next_commits(1);
        });
    }

    #[test]
    fn injected_failure_rolls_back_clock_out() {
        conformance::clock_out_failure_leaves_salary_unchanged(MemoryStore::new(), |store| {
            store.fail_next_commits(1);
        });
    }
}
