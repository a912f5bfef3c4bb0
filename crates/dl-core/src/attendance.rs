//! Attendance records and the per-day clock state machine.
//!
//! A driver's day moves `NotStarted -> ClockedIn -> ClockedOut`, or from
//! `NotStarted` straight to the terminal `OffDay`. The `decide_*` functions
//! are pure: given the stored record for the day they return the record to
//! write, or the reason the transition is refused. Stores run them inside
//! their atomic read-modify-write so the check and the write cannot
//! interleave with another writer.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AttendanceError, StoreError};
use crate::time::{Elapsed, WorkedTime, elapsed_between};

/// One side of a day's clock record in its stored form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMark {
    /// Not recorded yet.
    None,
    /// The day is an off day.
    Off,
    At(DateTime<Utc>),
}

impl ClockMark {
    pub const OFF_SENTINEL: &'static str = "OFF";

    pub const fn timestamp(self) -> Option<DateTime<Utc>> {
        match self {
            Self::At(at) => Some(at),
            Self::None | Self::Off => None,
        }
    }
}

impl fmt::Display for ClockMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("N/A"),
            Self::Off => f.write_str(Self::OFF_SENTINEL),
            Self::At(at) => write!(f, "{}", at.to_rfc3339()),
        }
    }
}

/// What happened on a recorded day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DayStatus {
    Working {
        clock_in: DateTime<Utc>,
        clock_out: Option<DateTime<Utc>>,
    },
    Off,
}

/// The attendance record for one driver on one business date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub status: DayStatus,
}

/// Position of a day in the clock state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceState {
    NotStarted,
    ClockedIn { at: DateTime<Utc> },
    ClockedOut { clock_in: DateTime<Utc>, clock_out: DateTime<Utc> },
    OffDay,
}

impl AttendanceRecord {
    pub const fn clocked_in(date: NaiveDate, at: DateTime<Utc>) -> Self {
        Self {
            date,
            status: DayStatus::Working {
                clock_in: at,
                clock_out: None,
            },
        }
    }

    pub const fn off(date: NaiveDate) -> Self {
        Self {
            date,
            status: DayStatus::Off,
        }
    }

    /// Rebuilds a record from its stored clock marks, enforcing the record
    /// invariants.
    pub fn from_marks(
        date: NaiveDate,
        clock_in: ClockMark,
        clock_out: ClockMark,
    ) -> Result<Self, StoreError> {
        let status = match (clock_in, clock_out) {
            (ClockMark::Off, ClockMark::Off) => DayStatus::Off,
            (ClockMark::At(clock_in), ClockMark::None) => DayStatus::Working {
                clock_in,
                clock_out: None,
            },
            (ClockMark::At(clock_in), ClockMark::At(clock_out)) => DayStatus::Working {
                clock_in,
                clock_out: Some(clock_out),
            },
            (clock_in, clock_out) => {
                return Err(StoreError::corrupt(format!(
                    "attendance on {date} has clock in {clock_in} and clock out {clock_out}"
                )));
            }
        };
        Ok(Self { date, status })
    }

    pub const fn clock_in(&self) -> ClockMark {
        match self.status {
            DayStatus::Working { clock_in, .. } => ClockMark::At(clock_in),
            DayStatus::Off => ClockMark::Off,
        }
    }

    pub const fn clock_out(&self) -> ClockMark {
        match self.status {
            DayStatus::Working {
                clock_out: Some(at),
                ..
            } => ClockMark::At(at),
            DayStatus::Working {
                clock_out: None, ..
            } => ClockMark::None,
            DayStatus::Off => ClockMark::Off,
        }
    }

    pub const fn state(&self) -> AttendanceState {
        match self.status {
            DayStatus::Working {
                clock_in,
                clock_out: None,
            } => AttendanceState::ClockedIn { at: clock_in },
            DayStatus::Working {
                clock_in,
                clock_out: Some(clock_out),
            } => AttendanceState::ClockedOut {
                clock_in,
                clock_out,
            },
            DayStatus::Off => AttendanceState::OffDay,
        }
    }

    /// Time worked on this day, once clocked out.
    pub fn worked(&self) -> Option<WorkedTime> {
        match self.status {
            DayStatus::Working {
                clock_in,
                clock_out: Some(clock_out),
            } => Some(elapsed_between(clock_in, clock_out).worked),
            _ => None,
        }
    }
}

/// State of the day given its (possibly missing) record.
pub fn state_of(record: Option<&AttendanceRecord>) -> AttendanceState {
    record.map_or(AttendanceState::NotStarted, AttendanceRecord::state)
}

/// A change to write for one driver-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceChange {
    pub record: AttendanceRecord,
    /// Worked time to accrue into the salary record, set on clock-out.
    pub accrue: Option<Elapsed>,
    /// The record already held this state; nothing needs writing.
    pub unchanged: bool,
}

impl AttendanceChange {
    const fn write(record: AttendanceRecord) -> Self {
        Self {
            record,
            accrue: None,
            unchanged: false,
        }
    }
}

pub fn decide_clock_in(
    existing: Option<&AttendanceRecord>,
    date: NaiveDate,
    at: DateTime<Utc>,
) -> Result<AttendanceChange, AttendanceError> {
    match state_of(existing) {
        AttendanceState::NotStarted => Ok(AttendanceChange::write(AttendanceRecord::clocked_in(
            date, at,
        ))),
        AttendanceState::ClockedIn { at: clocked_in }
        | AttendanceState::ClockedOut {
            clock_in: clocked_in,
            ..
        } => Err(AttendanceError::AlreadyClockedIn {
            date,
            at: clocked_in,
        }),
        AttendanceState::OffDay => Err(AttendanceError::CannotClockInOnOffDay { date }),
    }
}

pub fn decide_clock_out(
    existing: Option<&AttendanceRecord>,
    date: NaiveDate,
    at: DateTime<Utc>,
) -> Result<AttendanceChange, AttendanceError> {
    match state_of(existing) {
        AttendanceState::NotStarted | AttendanceState::OffDay => {
            Err(AttendanceError::NotClockedIn { date })
        }
        AttendanceState::ClockedOut { clock_out, .. } => {
            Err(AttendanceError::AlreadyClockedOut {
                date,
                at: clock_out,
            })
        }
        AttendanceState::ClockedIn { at: clock_in } => Ok(AttendanceChange {
            record: AttendanceRecord {
                date,
                status: DayStatus::Working {
                    clock_in,
                    clock_out: Some(at),
                },
            },
            accrue: Some(elapsed_between(clock_in, at)),
            unchanged: false,
        }),
    }
}

pub fn decide_off_day(
    existing: Option<&AttendanceRecord>,
    date: NaiveDate,
) -> Result<AttendanceChange, AttendanceError> {
    match state_of(existing) {
        AttendanceState::NotStarted => Ok(AttendanceChange::write(AttendanceRecord::off(date))),
        AttendanceState::OffDay => Ok(AttendanceChange {
            unchanged: true,
            ..AttendanceChange::write(AttendanceRecord::off(date))
        }),
        AttendanceState::ClockedIn { .. } | AttendanceState::ClockedOut { .. } => {
            Err(AttendanceError::AlreadyHasAttendance { date })
        }
    }
}
