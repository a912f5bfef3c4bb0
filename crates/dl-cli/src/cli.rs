//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::DriverArgs;
use crate::commands::account::{ClaimArgs, ClaimsArgs, TopupArgs};
use crate::commands::attendance::{CheckArgs, OffDayArgs};
use crate::commands::drivers::RegisterArgs;
use crate::commands::salary::SalaryArgs;
use crate::commands::summary::SummaryArgs;

/// Driver attendance, salary and expense ledger.
///
/// Records clock-ins, clock-outs and off days, accrues worked hours against
/// a salary, and keeps each driver's claim and top-up balance.
#[derive(Debug, Parser)]
#[command(name = "dl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create or update a driver's profile.
    Register(RegisterArgs),

    /// List known drivers.
    Drivers,

    /// Start today's shift.
    ClockIn(DriverArgs),

    /// End today's shift and accrue the worked hours.
    ClockOut(DriverArgs),

    /// Mark a day as an off day.
    OffDay(OffDayArgs),

    /// Submit an expense claim with its receipt.
    Claim(ClaimArgs),

    /// Credit a driver's balance (admin only).
    Topup(TopupArgs),

    /// Set a driver's monthly salary (admin only).
    Salary(SalaryArgs),

    /// Show one driver's balance.
    Balance(DriverArgs),

    /// Show every driver's balance.
    Balances,

    /// Show recent attendance.
    Check(CheckArgs),

    /// Page through claim history.
    Claims(ClaimsArgs),

    /// Summarize a driver's hours, pay and expenses.
    Summary(SummaryArgs),

    /// Print all records as JSON.
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_clock_in() {
        let cli = Cli::try_parse_from(["dl", "clock-in", "--driver", "1001"]).unwrap();
        let Some(Commands::ClockIn(args)) = cli.command else {
            panic!("expected clock-in, got {:?}", cli.command);
        };
        assert_eq!(args.driver.as_str(), "1001");
    }

    #[test]
    fn rejects_blank_driver() {
        assert!(Cli::try_parse_from(["dl", "balance", "--driver", "  "]).is_err());
    }

    #[test]
    fn month_conflicts_with_custom_range() {
        let result = Cli::try_parse_from([
            "dl", "summary", "--driver", "7", "--month", "2025-03", "--from", "today",
        ]);
        assert!(result.is_err());
    }
}
