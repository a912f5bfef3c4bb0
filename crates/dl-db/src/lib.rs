//! `SQLite` storage for the driver ledger.
//!
//! [`Database`] implements [`LedgerStore`] with `rusqlite`. Every mutating
//! operation runs in one `IMMEDIATE` transaction, so the write lock is taken
//! before the current state is read and two writers can never both pass the
//! same check.
//!
//! # Thread Safety
//!
//! A `Database` wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Share one behind a `Mutex`, or open one `Database` per thread;
//! separate connections to the same file serialize on the `SQLite` write lock
//! and wait up to [`BUSY_TIMEOUT`] for it.
//!
//! # Schema
//!
//! - Dates are stored as TEXT `YYYY-MM-DD`, so text order is date order.
//! - Timestamps are stored as TEXT RFC 3339 in UTC at whole seconds
//!   (e.g. `2025-03-03T01:00:00Z`).
//! - An off day stores the sentinel `OFF` in both `clock_in` and `clock_out`;
//!   a day still clocked in has a NULL `clock_out`.
//! - Money is stored as TEXT decimal strings so no precision is lost.
//! - Worked time is stored as INTEGER seconds.
//! - Claims and top-ups keep insertion order through their `seq` column.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use dl_core::{
    AccountRecord, AdminId, AttendanceChange, AttendanceError, AttendanceRecord, ClaimCategory,
    ClaimEntry, ClockMark, DateRange, DriverId, DriverProfile, LedgerError, LedgerStore, ProofRef,
    SalaryRecord, StoreError, TopupEntry, ValidationError, WorkedTime,
};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

/// How long a writer waits for another connection's write lock.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value could not be decoded.
    #[error("{table} row for driver {driver}: {message}")]
    Corrupt {
        table: &'static str,
        driver: String,
        message: String,
    },
}

impl DbError {
    fn corrupt(table: &'static str, driver: &str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            driver: driver.to_string(),
            message: message.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Corrupt { .. } => Self::corrupt(&err),
            DbError::Sqlite(_) => Self::with_source("sqlite operation failed", err),
        }
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened ledger database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS drivers (
                id TEXT PRIMARY KEY,
                username TEXT,
                first_name TEXT
            );

            -- clock_in: RFC 3339 timestamp, or 'OFF' for an off day
            -- clock_out: RFC 3339 timestamp, 'OFF', or NULL while clocked in
            CREATE TABLE IF NOT EXISTS attendance (
                driver_id TEXT NOT NULL,
                date TEXT NOT NULL,
                clock_in TEXT NOT NULL,
                clock_out TEXT,
                PRIMARY KEY (driver_id, date),
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS salaries (
                driver_id TEXT PRIMARY KEY,
                monthly_salary TEXT,
                total_seconds INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS daily_hours (
                driver_id TEXT NOT NULL,
                date TEXT NOT NULL,
                seconds INTEGER NOT NULL,
                PRIMARY KEY (driver_id, date),
                FOREIGN KEY (driver_id) REFERENCES salaries(driver_id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS accounts (
                driver_id TEXT PRIMARY KEY,
                balance TEXT NOT NULL DEFAULT '0',
                FOREIGN KEY (driver_id) REFERENCES drivers(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS claims (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                driver_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                kind TEXT NOT NULL,
                description TEXT,
                date TEXT NOT NULL,
                proof TEXT NOT NULL,
                FOREIGN KEY (driver_id) REFERENCES accounts(driver_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_claims_driver ON claims(driver_id);
            CREATE INDEX IF NOT EXISTS idx_claims_date ON claims(date);

            CREATE TABLE IF NOT EXISTS topups (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                driver_id TEXT NOT NULL,
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                initiated_by TEXT NOT NULL,
                FOREIGN KEY (driver_id) REFERENCES accounts(driver_id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_topups_driver ON topups(driver_id);
            ",
        )?;
        Ok(())
    }

    fn write_transaction(&mut self) -> Result<Transaction<'_>, DbError> {
        Ok(self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?)
    }

    fn read_profile(&self, driver: &DriverId) -> Result<Option<DriverProfile>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT username, first_name FROM drivers WHERE id = ?",
                [driver.as_str()],
                |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?;
        Ok(row.map(|(username, first_name)| DriverProfile {
            id: driver.clone(),
            username,
            first_name,
        }))
    }

    fn read_profiles(&self) -> Result<Vec<DriverProfile>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, username, first_name FROM drivers ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut profiles = Vec::new();
        for row in rows {
            let (id, username, first_name) = row?;
            profiles.push(DriverProfile {
                id: parse_driver(&id, "drivers")?,
                username,
                first_name,
            });
        }
        Ok(profiles)
    }

    fn read_attendance_in(
        &self,
        driver: &DriverId,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, DbError> {
        let (start, end) = stored_bounds(range);
        let mut stmt = self.conn.prepare(
            "
            SELECT date, clock_in, clock_out
            FROM attendance
            WHERE driver_id = ? AND date BETWEEN ? AND ?
            ORDER BY date ASC
            ",
        )?;
        let rows = stmt.query_map(params![driver.as_str(), start, end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (date, clock_in, clock_out) = row?;
            let date = parse_date(&date, "attendance", driver)?;
            records.push(decode_attendance(
                driver,
                date,
                &clock_in,
                clock_out.as_deref(),
            )?);
        }
        Ok(records)
    }

    /// Reads the salary record and its daily entries from one snapshot.
    fn read_salary(&self, driver: &DriverId) -> Result<Option<SalaryRecord>, DbError> {
        let tx = self.conn.unchecked_transaction()?;
        let salary = load_salary(&tx, driver)?;
        tx.commit()?;
        Ok(salary)
    }

    /// Reads the balance and both histories from one snapshot, so a
    /// concurrent append on another connection is seen entirely or not at
    /// all.
    fn read_account(&self, driver: &DriverId) -> Result<Option<AccountRecord>, DbError> {
        let tx = self.conn.unchecked_transaction()?;
        let account = load_account(&tx, driver)?;
        tx.commit()?;
        Ok(account)
    }

    fn read_balances(&self) -> Result<Vec<(DriverId, Decimal)>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT driver_id, balance FROM accounts ORDER BY driver_id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut balances = Vec::new();
        for row in rows {
            let (driver, balance) = row?;
            let driver = parse_driver(&driver, "accounts")?;
            let balance = parse_money(&balance, "accounts", &driver)?;
            balances.push((driver, balance));
        }
        Ok(balances)
    }

    /// Runs an attendance transition in one write transaction. The outer
    /// result is the storage outcome, the inner one the decision.
    fn transition(
        &mut self,
        driver: &DriverId,
        date: NaiveDate,
        decide: impl FnOnce(Option<&AttendanceRecord>) -> Result<AttendanceChange, AttendanceError>,
    ) -> Result<Result<AttendanceChange, AttendanceError>, DbError> {
        let tx = self.write_transaction()?;
        let existing = tx
            .query_row(
                "SELECT clock_in, clock_out FROM attendance WHERE driver_id = ? AND date = ?",
                params![driver.as_str(), format_date(date)],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            )
            .optional()?
            .map(|(clock_in, clock_out)| {
                decode_attendance(driver, date, &clock_in, clock_out.as_deref())
            })
            .transpose()?;

        let change = match decide(existing.as_ref()) {
            Ok(change) => change,
            Err(refused) => return Ok(Err(refused)),
        };
        if change.unchanged {
            return Ok(Ok(change));
        }

        ensure_driver(&tx, driver)?;
        tx.execute(
            "
            INSERT INTO attendance (driver_id, date, clock_in, clock_out)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(driver_id, date) DO UPDATE SET
                clock_in = excluded.clock_in,
                clock_out = excluded.clock_out
            ",
            params![
                driver.as_str(),
                format_date(date),
                encode_mark(change.record.clock_in()),
                encode_mark(change.record.clock_out()),
            ],
        )?;

        if let Some(elapsed) = change.accrue {
            ensure_salary(&tx, driver)?;
            let previous: i64 = tx
                .query_row(
                    "SELECT seconds FROM daily_hours WHERE driver_id = ? AND date = ?",
                    params![driver.as_str(), format_date(date)],
                    |row| row.get(0),
                )
                .optional()?
                .unwrap_or(0);
            tx.execute(
                "UPDATE salaries SET total_seconds = MAX(total_seconds - ? + ?, 0) WHERE driver_id = ?",
                params![previous, elapsed.worked.seconds(), driver.as_str()],
            )?;
            tx.execute(
                "
                INSERT INTO daily_hours (driver_id, date, seconds)
                VALUES (?, ?, ?)
                ON CONFLICT(driver_id, date) DO UPDATE SET seconds = excluded.seconds
                ",
                params![driver.as_str(), format_date(date), elapsed.worked.seconds()],
            )?;
        }

        tx.commit()?;
        Ok(Ok(change))
    }

    fn write_profile(&mut self, profile: &DriverProfile) -> Result<(), DbError> {
        let tx = self.write_transaction()?;
        tx.execute(
            "
            INSERT INTO drivers (id, username, first_name)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name
            ",
            params![profile.id.as_str(), profile.username, profile.first_name],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn write_monthly_salary(
        &mut self,
        driver: &DriverId,
        monthly_salary: Decimal,
    ) -> Result<(), DbError> {
        let tx = self.write_transaction()?;
        ensure_driver(&tx, driver)?;
        ensure_salary(&tx, driver)?;
        tx.execute(
            "UPDATE salaries SET monthly_salary = ? WHERE driver_id = ?",
            params![monthly_salary.to_string(), driver.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Applies an entry to the current account with `apply`, stores the new
    /// balance, then runs `append` to write the history row, all in one
    /// transaction. A refused entry writes nothing.
    fn write_with_balance(
        &mut self,
        driver: &DriverId,
        apply: impl FnOnce(&mut AccountRecord) -> Result<Decimal, ValidationError>,
        append: impl FnOnce(&Transaction<'_>) -> Result<(), DbError>,
    ) -> Result<Result<Decimal, ValidationError>, DbError> {
        let tx = self.write_transaction()?;
        let mut account = load_account(&tx, driver)?.unwrap_or_default();
        let balance = match apply(&mut account) {
            Ok(balance) => balance,
            Err(refused) => return Ok(Err(refused)),
        };
        ensure_driver(&tx, driver)?;
        tx.execute(
            "
            INSERT INTO accounts (driver_id, balance) VALUES (?, ?)
            ON CONFLICT(driver_id) DO UPDATE SET balance = excluded.balance
            ",
            params![driver.as_str(), balance.to_string()],
        )?;
        append(&tx)?;
        tx.commit()?;
        Ok(Ok(balance))
    }
}

impl LedgerStore for Database {
    fn register_driver(&mut self, profile: &DriverProfile) -> Result<(), StoreError> {
        Ok(self.write_profile(profile)?)
    }

    fn driver(&self, driver: &DriverId) -> Result<Option<DriverProfile>, StoreError> {
        Ok(self.read_profile(driver)?)
    }

    fn drivers(&self) -> Result<Vec<DriverProfile>, StoreError> {
        Ok(self.read_profiles()?)
    }

    fn attendance(
        &self,
        driver: &DriverId,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.read_attendance_in(driver, DateRange::day(date))?.pop())
    }

    fn attendance_in(
        &self,
        driver: &DriverId,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.read_attendance_in(driver, range)?)
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
        let change = self
            .transition(driver, date, decide)
            .map_err(StoreError::from)??;
        Ok(change)
    }

    fn salary(&self, driver: &DriverId) -> Result<Option<SalaryRecord>, StoreError> {
        Ok(self.read_salary(driver)?)
    }

    fn set_monthly_salary(
        &mut self,
        driver: &DriverId,
        monthly_salary: Decimal,
    ) -> Result<SalaryRecord, StoreError> {
        self.write_monthly_salary(driver, monthly_salary)?;
        self.read_salary(driver)?
            .ok_or_else(|| StoreError::new(format!("salary for {driver} vanished after write")))
    }

    fn account(&self, driver: &DriverId) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.read_account(driver)?)
    }

    fn balance(&self, driver: &DriverId) -> Result<Option<Decimal>, StoreError> {
        let balance = self
            .conn
            .query_row(
                "SELECT balance FROM accounts WHERE driver_id = ?",
                [driver.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(DbError::from)?;
        Ok(balance
            .map(|value| parse_money(&value, "accounts", driver))
            .transpose()?)
    }

    fn balances(&self) -> Result<Vec<(DriverId, Decimal)>, StoreError> {
        Ok(self.read_balances()?)
    }

    fn append_claim(
        &mut self,
        driver: &DriverId,
        claim: &ClaimEntry,
    ) -> Result<Decimal, LedgerError> {
        let apply = |account: &mut AccountRecord| account.apply_claim(claim.clone());
        let balance = self
            .write_with_balance(driver, apply, |tx| {
                tx.execute(
                    "
                    INSERT INTO claims (id, driver_id, amount, kind, description, date, proof)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    ",
                    params![
                        claim.id.to_string(),
                        driver.as_str(),
                        claim.amount.to_string(),
                        claim.category.kind(),
                        claim.category.description(),
                        format_date(claim.date),
                        claim.proof.as_str(),
                    ],
                )?;
                Ok(())
            })
            .map_err(StoreError::from)??;
        Ok(balance)
    }

    fn append_topup(
        &mut self,
        driver: &DriverId,
        topup: &TopupEntry,
    ) -> Result<Decimal, LedgerError> {
        let apply = |account: &mut AccountRecord| account.apply_topup(topup.clone());
        let balance = self
            .write_with_balance(driver, apply, |tx| {
                tx.execute(
                    "
                    INSERT INTO topups (id, driver_id, amount, date, initiated_by)
                    VALUES (?, ?, ?, ?, ?)
                    ",
                    params![
                        topup.id.to_string(),
                        driver.as_str(),
                        topup.amount.to_string(),
                        format_date(topup.date),
                        topup.initiated_by.as_str(),
                    ],
                )?;
                Ok(())
            })
            .map_err(StoreError::from)??;
        Ok(balance)
    }
}

fn load_salary(conn: &Connection, driver: &DriverId) -> Result<Option<SalaryRecord>, DbError> {
    let row = conn
        .query_row(
            "SELECT monthly_salary, total_seconds FROM salaries WHERE driver_id = ?",
            [driver.as_str()],
            |row| Ok((row.get::<_, Option<String>>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;
    let Some((monthly_salary, total_seconds)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT date, seconds FROM daily_hours WHERE driver_id = ? ORDER BY date ASC",
    )?;
    let rows = stmt.query_map([driver.as_str()], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;
    let mut record = SalaryRecord {
        monthly_salary: monthly_salary
            .as_deref()
            .map(|value| parse_money(value, "salaries", driver))
            .transpose()?,
        total_worked: stored_seconds(total_seconds, "salaries", driver)?,
        ..SalaryRecord::default()
    };
    for row in rows {
        let (date, seconds) = row?;
        let date = parse_date(&date, "daily_hours", driver)?;
        record
            .daily
            .insert(date, stored_seconds(seconds, "daily_hours", driver)?);
    }
    Ok(Some(record))
}

fn load_account(conn: &Connection, driver: &DriverId) -> Result<Option<AccountRecord>, DbError> {
    let balance = conn
        .query_row(
            "SELECT balance FROM accounts WHERE driver_id = ?",
            [driver.as_str()],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    let Some(balance) = balance else {
        return Ok(None);
    };
    Ok(Some(AccountRecord {
        balance: parse_money(&balance, "accounts", driver)?,
        claims: load_claims(conn, driver)?,
        topups: load_topups(conn, driver)?,
    }))
}

fn load_claims(conn: &Connection, driver: &DriverId) -> Result<Vec<ClaimEntry>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, amount, kind, description, date, proof
        FROM claims
        WHERE driver_id = ?
        ORDER BY seq ASC
        ",
    )?;
    let rows = stmt.query_map([driver.as_str()], |row| {
        Ok(ClaimRow {
            id: row.get(0)?,
            amount: row.get(1)?,
            kind: row.get(2)?,
            description: row.get(3)?,
            date: row.get(4)?,
            proof: row.get(5)?,
        })
    })?;
    let mut claims = Vec::new();
    for row in rows {
        claims.push(row?.decode(driver)?);
    }
    Ok(claims)
}

fn load_topups(conn: &Connection, driver: &DriverId) -> Result<Vec<TopupEntry>, DbError> {
    let mut stmt = conn.prepare(
        "
        SELECT id, amount, date, initiated_by
        FROM topups
        WHERE driver_id = ?
        ORDER BY seq ASC
        ",
    )?;
    let rows = stmt.query_map([driver.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;
    let mut topups = Vec::new();
    for row in rows {
        let (id, amount, date, initiated_by) = row?;
        topups.push(TopupEntry {
            id: parse_uuid(&id, "topups", driver)?,
            amount: parse_money(&amount, "topups", driver)?,
            date: parse_date(&date, "topups", driver)?,
            initiated_by: AdminId::new(initiated_by)
                .map_err(|err| DbError::corrupt("topups", driver.as_str(), err.to_string()))?,
        });
    }
    Ok(topups)
}

/// Stored durations are never negative; one that is means the row was
/// written by something other than this store.
fn stored_seconds(
    seconds: i64,
    table: &'static str,
    driver: &DriverId,
) -> Result<WorkedTime, DbError> {
    if seconds < 0 {
        return Err(DbError::corrupt(
            table,
            driver.as_str(),
            format!("negative seconds {seconds}"),
        ));
    }
    Ok(WorkedTime::from_seconds(seconds))
}

struct ClaimRow {
    id: String,
    amount: String,
    kind: String,
    description: Option<String>,
    date: String,
    proof: String,
}

impl ClaimRow {
    fn decode(self, driver: &DriverId) -> Result<ClaimEntry, DbError> {
        let invalid = |err: dl_core::ValidationError| {
            DbError::corrupt("claims", driver.as_str(), err.to_string())
        };
        Ok(ClaimEntry {
            id: parse_uuid(&self.id, "claims", driver)?,
            amount: parse_money(&self.amount, "claims", driver)?,
            category: ClaimCategory::from_parts(&self.kind, self.description.as_deref())
                .map_err(invalid)?,
            date: parse_date(&self.date, "claims", driver)?,
            proof: ProofRef::new(self.proof).map_err(invalid)?,
        })
    }
}

/// Records the driver if this is the first write that mentions them.
fn ensure_driver(tx: &Transaction<'_>, driver: &DriverId) -> Result<(), DbError> {
    tx.execute(
        "INSERT OR IGNORE INTO drivers (id) VALUES (?)",
        [driver.as_str()],
    )?;
    Ok(())
}

fn ensure_salary(tx: &Transaction<'_>, driver: &DriverId) -> Result<(), DbError> {
    tx.execute(
        "INSERT OR IGNORE INTO salaries (driver_id, total_seconds) VALUES (?, 0)",
        [driver.as_str()],
    )?;
    Ok(())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Query bounds for `range`, clamped to four-digit years so text comparison
/// stays correct for unbounded ranges.
fn stored_bounds(range: DateRange) -> (String, String) {
    let floor = NaiveDate::from_ymd_opt(0, 1, 1).unwrap_or(NaiveDate::MIN);
    let ceiling = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX);
    (
        format_date(range.start().clamp(floor, ceiling)),
        format_date(range.end().clamp(floor, ceiling)),
    )
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn encode_mark(mark: ClockMark) -> Option<String> {
    match mark {
        ClockMark::None => None,
        ClockMark::Off => Some(ClockMark::OFF_SENTINEL.to_string()),
        ClockMark::At(at) => Some(format_timestamp(at)),
    }
}

fn decode_mark(value: Option<&str>, driver: &DriverId) -> Result<ClockMark, DbError> {
    match value {
        None => Ok(ClockMark::None),
        Some(ClockMark::OFF_SENTINEL) => Ok(ClockMark::Off),
        Some(timestamp) => DateTime::parse_from_rfc3339(timestamp)
            .map(|at| ClockMark::At(at.with_timezone(&Utc)))
            .map_err(|err| {
                DbError::corrupt(
                    "attendance",
                    driver.as_str(),
                    format!("invalid timestamp {timestamp}: {err}"),
                )
            }),
    }
}

fn decode_attendance(
    driver: &DriverId,
    date: NaiveDate,
    clock_in: &str,
    clock_out: Option<&str>,
) -> Result<AttendanceRecord, DbError> {
    let clock_in = decode_mark(Some(clock_in), driver)?;
    let clock_out = decode_mark(clock_out, driver)?;
    AttendanceRecord::from_marks(date, clock_in, clock_out).map_err(|_| {
        DbError::corrupt(
            "attendance",
            driver.as_str(),
            format!("{date} has clock in {clock_in} and clock out {clock_out}"),
        )
    })
}

fn parse_date(value: &str, table: &'static str, driver: &DriverId) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| {
        DbError::corrupt(table, driver.as_str(), format!("invalid date {value}: {err}"))
    })
}

fn parse_money(value: &str, table: &'static str, driver: &DriverId) -> Result<Decimal, DbError> {
    Decimal::from_str(value).map_err(|err| {
        DbError::corrupt(table, driver.as_str(), format!("invalid amount {value}: {err}"))
    })
}

fn parse_uuid(value: &str, table: &'static str, driver: &DriverId) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|err| {
        DbError::corrupt(table, driver.as_str(), format!("invalid id {value}: {err}"))
    })
}

fn parse_driver(value: &str, table: &'static str) -> Result<DriverId, DbError> {
    DriverId::new(value).map_err(|err| DbError::corrupt(table, value, err.to_string()))
}
