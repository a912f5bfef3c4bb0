//! Monthly salary command.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use dl_core::{AdminId, Clock, Ledger, LedgerStore};
use rust_decimal::Decimal;

use super::DriverArgs;
use super::util::{format_money, parse_admin_id};
use crate::Config;

#[derive(Debug, Args)]
pub struct SalaryArgs {
    /// ID of the admin setting the salary.
    #[arg(long, value_parser = parse_admin_id)]
    pub admin: AdminId,
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Monthly salary, e.g. 3500.00.
    #[arg(long)]
    pub amount: Decimal,
}

pub fn run<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    config: &Config,
    args: &SalaryArgs,
) -> Result<()> {
    config.require_admin(&args.admin)?;
    let driver = &args.driver.driver;
    let rate = ledger.set_monthly_salary(driver, args.amount)?;
    let name = ledger.driver(driver)?.display_name();
    writeln!(
        writer,
        "Monthly salary for {name} set to {}",
        format_money(args.amount)
    )?;
    writeln!(writer, "Hourly rate: {}", format_money(rate))?;
    writeln!(
        writer,
        "Gross pay so far: {}",
        format_money(ledger.gross_pay(driver)?)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{driver_args, ledger, text};

    use chrono::Duration;
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    fn config() -> Config {
        Config {
            admin_ids: vec!["9".to_string()],
            ..Config::default()
        }
    }

    #[test]
    fn salary_sets_hourly_rate() {
        let (mut ledger, clock) = ledger();
        let driver = driver_args(1001);
        ledger.clock_in(&driver.driver).unwrap();
        clock.advance(Duration::hours(9));
        ledger.clock_out(&driver.driver).unwrap();

        let mut output = Vec::new();
        let args = SalaryArgs {
            admin: AdminId::from(9_u64),
            driver,
            amount: dec!(3500),
        };
        run(&mut output, &mut ledger, &config(), &args).unwrap();

        assert_snapshot!(text(output), @r"
        Monthly salary for User 1001 set to 3500.00
        Hourly rate: 19.89
        Gross pay so far: 179.01
        ");
    }

    #[test]
    fn salary_rejects_non_admin_and_bad_amount() {
        let (mut ledger, _clock) = ledger();
        let args = SalaryArgs {
            admin: AdminId::from(3_u64),
            driver: driver_args(1001),
            amount: dec!(3500),
        };
        let err = run(&mut Vec::new(), &mut ledger, &config(), &args).unwrap_err();
        assert!(err.to_string().contains("not authorized"));

        let args = SalaryArgs {
            admin: AdminId::from(9_u64),
            driver: driver_args(1001),
            amount: dec!(-1),
        };
        let err = run(&mut Vec::new(), &mut ledger, &config(), &args).unwrap_err();
        assert_eq!(err.to_string(), "amount must be greater than zero, got -1");
    }
}
