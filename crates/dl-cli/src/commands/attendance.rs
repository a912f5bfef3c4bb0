//! Clock-in, clock-out, off-day and recent attendance commands.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use dl_core::{Clock, DayStatus, Ledger, LedgerStore};

use super::DriverArgs;
use super::util::parse_date;

#[derive(Debug, Args)]
pub struct OffDayArgs {
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Date to mark: YYYY-MM-DD, today, yesterday or "N days ago".
    #[arg(long, default_value = "today")]
    pub date: String,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Number of most recent days to show.
    #[arg(long, default_value_t = 7)]
    pub limit: usize,
}

pub fn clock_in<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    args: &DriverArgs,
) -> Result<()> {
    let receipt = ledger.clock_in(&args.driver)?;
    let calendar = ledger.settings().calendar;
    writeln!(writer, "Clocked in at {}", calendar.format_local(receipt.at))?;
    Ok(())
}

pub fn clock_out<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    args: &DriverArgs,
) -> Result<()> {
    let receipt = ledger.clock_out(&args.driver)?;
    let calendar = ledger.settings().calendar;
    writeln!(writer, "Clocked out at {}", calendar.format_local(receipt.at))?;
    writeln!(writer, "Worked: {}", receipt.elapsed)?;
    Ok(())
}

pub fn off_day<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    args: &OffDayArgs,
) -> Result<()> {
    let date = parse_date(&args.date, ledger.today())?;
    ledger.mark_off_day(&args.driver.driver, date)?;
    writeln!(writer, "Marked {date} as an off day")?;
    Ok(())
}

/// Shows the latest attendance records, newest first.
pub fn check<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
    args: &CheckArgs,
) -> Result<()> {
    let driver = &args.driver.driver;
    let name = ledger.driver(driver)?.display_name();
    let records = ledger.recent_attendance(driver, args.limit)?;
    if records.is_empty() {
        writeln!(writer, "No attendance recorded for {name}.")?;
        return Ok(());
    }

    let calendar = ledger.settings().calendar;
    let clock_time = |at: DateTime<Utc>| calendar.local(at).format("%H:%M").to_string();
    writeln!(writer, "Attendance for {name} (last {} days)", records.len())?;
    for record in records {
        match record.status {
            DayStatus::Off => writeln!(writer, "{}  OFF", record.date)?,
            DayStatus::Working {
                clock_in,
                clock_out: None,
            } => writeln!(
                writer,
                "{}  in {}  out -      in progress",
                record.date,
                clock_time(clock_in)
            )?,
            DayStatus::Working {
                clock_in,
                clock_out: Some(clock_out),
            } => {
                let worked = record.worked().unwrap_or_default();
                writeln!(
                    writer,
                    "{}  in {}  out {}  {worked}",
                    record.date,
                    clock_time(clock_in),
                    clock_time(clock_out)
                )?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{driver_args, ledger, text};

    use chrono::Duration;
    use dl_core::AttendanceError;
    use insta::assert_snapshot;

    #[test]
    fn clock_in_and_out_report_local_times() {
        let (mut ledger, clock) = ledger();
        let args = driver_args(1001);

        let mut output = Vec::new();
        clock_in(&mut output, &mut ledger, &args).unwrap();
        clock.advance(Duration::minutes(135));
        clock_out(&mut output, &mut ledger, &args).unwrap();

        assert_snapshot!(text(output), @r"
        Clocked in at 2025-03-03 09:00
        Clocked out at 2025-03-03 11:15
        Worked: 2Hour 15Min
        ");
    }

    #[test]
    fn clock_in_twice_reports_state_error() {
        let (mut ledger, _clock) = ledger();
        let args = driver_args(1001);
        clock_in(&mut Vec::new(), &mut ledger, &args).unwrap();

        let err = clock_in(&mut Vec::new(), &mut ledger, &args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<dl_core::LedgerError>()
                .and_then(dl_core::LedgerError::as_attendance),
            Some(AttendanceError::AlreadyClockedIn { .. })
        ));
        assert_eq!(
            err.to_string(),
            "already clocked in on 2025-03-03 at 2025-03-03 01:00:00 UTC"
        );
    }

    #[test]
    fn off_day_accepts_relative_dates() {
        let (mut ledger, _clock) = ledger();
        let args = OffDayArgs {
            driver: driver_args(1001),
            date: "2 days ago".to_string(),
        };

        let mut output = Vec::new();
        off_day(&mut output, &mut ledger, &args).unwrap();
        assert_snapshot!(text(output), @"Marked 2025-03-01 as an off day");
    }

    #[test]
    fn check_lists_newest_first() {
        let (mut ledger, clock) = ledger();
        let args = driver_args(1001);
        let off = OffDayArgs {
            driver: driver_args(1001),
            date: "yesterday".to_string(),
        };
        off_day(&mut Vec::new(), &mut ledger, &off).unwrap();
        clock_in(&mut Vec::new(), &mut ledger, &args).unwrap();
        clock.advance(Duration::hours(8));
        clock_out(&mut Vec::new(), &mut ledger, &args).unwrap();
        clock.advance(Duration::hours(16));
        clock_in(&mut Vec::new(), &mut ledger, &args).unwrap();

        let mut output = Vec::new();
        let check_args = CheckArgs {
            driver: driver_args(1001),
            limit: 7,
        };
        check(&mut output, &ledger, &check_args).unwrap();

        assert_snapshot!(text(output), @r"
        Attendance for User 1001 (last 3 days)
        2025-03-04  in 09:00  out -      in progress
        2025-03-03  in 09:00  out 17:00  8Hour
        2025-03-02  OFF
        ");
    }

    #[test]
    fn check_without_records() {
        let (ledger, _clock) = ledger();
        let mut output = Vec::new();
        let args = CheckArgs {
            driver: driver_args(5),
            limit: 7,
        };
        check(&mut output, &ledger, &args).unwrap();
        assert_snapshot!(text(output), @"No attendance recorded for User 5.");
    }
}
