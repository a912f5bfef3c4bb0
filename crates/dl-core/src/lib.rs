//! Core domain logic for the driver ledger.
//!
//! This crate contains:
//! - Attendance: the per-day clock-in / clock-out / off-day state machine
//! - Salary: hourly rate derivation and worked-time accrual
//! - Accounts: claims and admin top-ups against a running balance
//! - The [`LedgerStore`] seam and an in-memory implementation
//! - The [`Ledger`] service that command handlers call into

pub mod account;
pub mod attendance;
pub mod error;
mod ledger;
mod memory;
pub mod salary;
mod store;
pub mod summary;
pub mod time;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod conformance;

pub use account::{AccountRecord, ClaimEntry, NewClaim, TopupEntry};
pub use attendance::{AttendanceChange, AttendanceRecord, AttendanceState, ClockMark, DayStatus};
pub use error::{AttendanceError, ErrorKind, LedgerError, StoreError};
pub use ledger::{ClockInReceipt, ClockOutReceipt, Ledger, LedgerSettings};
pub use memory::MemoryStore;
pub use salary::{RateConfig, SalaryRecord};
pub use store::LedgerStore;
pub use summary::{ClaimPage, DriverClaim, DriverSummary, LedgerExport};
pub use time::{BusinessCalendar, Clock, DateRange, FixedClock, SystemClock, WorkedTime};
pub use types::{AdminId, ClaimCategory, DriverId, DriverProfile, ProofRef, ValidationError};
