//! Per-driver summary report.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use dl_core::{Clock, DateRange, DriverSummary, Ledger, LedgerStore, time::format_hours};

use super::DriverArgs;
use super::util::{format_money, parse_date, parse_month};

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Month to summarize as YYYY-MM. Defaults to the current month.
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<String>,
    /// Start of a custom range.
    #[arg(long)]
    pub from: Option<String>,
    /// End of a custom range. Defaults to today.
    #[arg(long)]
    pub to: Option<String>,
    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
    args: &SummaryArgs,
) -> Result<()> {
    let range = resolve_range(args, ledger.today())?;
    let summary = ledger.driver_summary(&args.driver.driver, range)?;

    if args.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&summary)?)?;
        return Ok(());
    }
    write_text(writer, &summary)
}

/// Works out the reporting window from `--month`, `--from` and `--to`.
fn resolve_range(args: &SummaryArgs, today: chrono::NaiveDate) -> Result<DateRange> {
    if let Some(month) = &args.month {
        return parse_month(month);
    }
    let current_month = DateRange::month_of(today);
    let end = match &args.to {
        Some(to) => parse_date(to, today)?,
        None => today,
    };
    let start = match &args.from {
        Some(from) => parse_date(from, today)?,
        None if args.to.is_some() => DateRange::month_of(end).start(),
        None => return Ok(current_month),
    };
    Ok(DateRange::new(start, end)?)
}

fn write_text<W: Write>(writer: &mut W, summary: &DriverSummary) -> Result<()> {
    writeln!(
        writer,
        "Summary for {} ({})",
        summary.driver.display_name(),
        summary.range
    )?;
    writeln!(
        writer,
        "Days worked: {}  Days off: {}",
        summary.days_worked(),
        summary.days_off()
    )?;
    writeln!(
        writer,
        "Hours: {} (all time {})",
        format_hours(summary.hours_in_range),
        format_hours(summary.total_hours)
    )?;
    let salary = summary
        .monthly_salary
        .map_or_else(|| "not set".to_string(), format_money);
    writeln!(
        writer,
        "Monthly salary: {salary}  Hourly rate: {}",
        format_money(summary.hourly_rate)
    )?;
    writeln!(
        writer,
        "Pay: {} (all time {})",
        format_money(summary.pay_in_range),
        format_money(summary.gross_pay)
    )?;
    writeln!(
        writer,
        "Claims: {} ({})  Top-ups: {} ({})",
        summary.claims.len(),
        format_money(summary.claimed_in_range),
        summary.topups.len(),
        format_money(summary.topped_up_in_range)
    )?;
    writeln!(writer, "Balance: {}", format_money(summary.balance))?;
    Ok(())
}
