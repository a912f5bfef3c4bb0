//! Claim, top-up and balance commands.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use dl_core::{AdminId, ClaimCategory, Clock, DriverId, Ledger, LedgerStore, NewClaim, ProofRef};
use rust_decimal::Decimal;

use super::DriverArgs;
use super::util::{format_money, parse_admin_id, parse_date, parse_driver_id};
use crate::Config;

#[derive(Debug, Args)]
pub struct ClaimArgs {
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Expense type: toll, petrol or other.
    #[arg(long)]
    pub category: String,
    /// What an `other` claim is for.
    #[arg(long)]
    pub description: Option<String>,
    /// Claimed amount, e.g. 12.40.
    #[arg(long)]
    pub amount: Decimal,
    /// Reference to the uploaded receipt photo.
    #[arg(long)]
    pub proof: Option<String>,
    /// Date of the expense: YYYY-MM-DD, today, yesterday or "N days ago".
    #[arg(long, default_value = "today")]
    pub date: String,
}

#[derive(Debug, Args)]
pub struct TopupArgs {
    /// ID of the admin issuing the top-up.
    #[arg(long, value_parser = parse_admin_id)]
    pub admin: AdminId,
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Amount to credit.
    #[arg(long)]
    pub amount: Decimal,
    #[arg(long, default_value = "today")]
    pub date: String,
}

#[derive(Debug, Args)]
pub struct ClaimsArgs {
    /// Only show claims of this driver.
    #[arg(long, value_parser = parse_driver_id)]
    pub driver: Option<DriverId>,
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    #[arg(long, default_value_t = 5)]
    pub per_page: usize,
}

pub fn claim<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    args: &ClaimArgs,
) -> Result<()> {
    let category = ClaimCategory::from_parts(&args.category, args.description.as_deref())?;
    // A blank proof is the same as none.
    let proof = args
        .proof
        .as_deref()
        .filter(|proof| !proof.trim().is_empty())
        .map(ProofRef::new)
        .transpose()?;
    let date = parse_date(&args.date, ledger.today())?;

    let balance = ledger.submit_claim(
        &args.driver.driver,
        NewClaim {
            category: category.clone(),
            amount: args.amount,
            date,
            proof,
        },
    )?;
    writeln!(
        writer,
        "Claim recorded: {category} {} on {date}",
        format_money(args.amount)
    )?;
    writeln!(writer, "Balance: {}", format_money(balance))?;
    Ok(())
}

pub fn topup<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    config: &Config,
    args: &TopupArgs,
) -> Result<()> {
    config.require_admin(&args.admin)?;
    let date = parse_date(&args.date, ledger.today())?;
    let driver = &args.driver.driver;

    let balance = ledger.topup(driver, args.amount, date, &args.admin)?;
    let name = ledger.driver(driver)?.display_name();
    writeln!(
        writer,
        "Topped up {} for {name}",
        format_money(args.amount)
    )?;
    writeln!(writer, "Balance: {}", format_money(balance))?;
    Ok(())
}

pub fn balance<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
    args: &DriverArgs,
) -> Result<()> {
    let balance = ledger.balance(&args.driver)?;
    let name = ledger.driver(&args.driver)?.display_name();
    writeln!(writer, "Balance for {name}: {}", format_money(balance))?;
    Ok(())
}

/// Lists every account's balance.
pub fn balances<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
) -> Result<()> {
    let balances = ledger.balances()?;
    if balances.is_empty() {
        writeln!(writer, "No accounts yet.")?;
        return Ok(());
    }
    for (profile, balance) in balances {
        writeln!(
            writer,
            "{:<12} {:<24} {:>10}",
            profile.id.as_str(),
            profile.display_name(),
            format_money(balance)
        )?;
    }
    Ok(())
}

/// Shows one page of claim history, newest first.
pub fn claims<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
    args: &ClaimsArgs,
) -> Result<()> {
    let page = ledger.claims_page(args.driver.as_ref(), args.page, args.per_page)?;
    if page.total_claims == 0 {
        writeln!(writer, "No claims recorded.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "Claims (page {} of {}, {} total)",
        page.page, page.total_pages, page.total_claims
    )?;
    if page.claims.is_empty() {
        writeln!(writer, "No claims on this page.")?;
    }
    for entry in &page.claims {
        let name = ledger.driver(&entry.driver)?.display_name();
        writeln!(
            writer,
            "{}  {name}  {}  {}  proof: {}",
            entry.claim.date,
            entry.claim.category,
            format_money(entry.claim.amount),
            entry.claim.proof
        )?;
    }
    if page.has_next() {
        writeln!(writer, "More: --page {}", page.page + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{driver_args, ledger, text};

    use dl_core::{DriverProfile, ErrorKind, LedgerError, ValidationError};
    use insta::assert_snapshot;
    use rust_decimal_macros::dec;

    fn claim_args(category: &str, amount: Decimal, proof: Option<&str>) -> ClaimArgs {
        ClaimArgs {
            driver: driver_args(1001),
            category: category.to_string(),
            description: None,
            amount,
            proof: proof.map(str::to_string),
            date: "today".to_string(),
        }
    }

    fn admin_config() -> Config {
        Config {
            admin_ids: vec!["9".to_string()],
            ..Config::default()
        }
    }

    fn topup_args(admin: u64, amount: Decimal) -> TopupArgs {
        TopupArgs {
            admin: AdminId::from(admin),
            driver: driver_args(1001),
            amount,
            date: "today".to_string(),
        }
    }

    #[test]
    fn claim_then_topup_updates_balance() {
        let (mut ledger, _clock) = ledger();
        let mut output = Vec::new();

        claim(&mut output, &mut ledger, &claim_args("toll", dec!(50), Some("photo-1"))).unwrap();
        topup(&mut output, &mut ledger, &admin_config(), &topup_args(9, dec!(100))).unwrap();
        balance(&mut output, &ledger, &driver_args(1001)).unwrap();

        assert_snapshot!(text(output), @r"
        Claim recorded: toll 50.00 on 2025-03-03
        Balance: -50.00
        Topped up 100.00 for User 1001
        Balance: 50.00
        Balance for User 1001: 50.00
        ");
    }

    #[test]
    fn claim_without_proof_is_rejected() {
        let (mut ledger, _clock) = ledger();
        for proof in [None, Some("   ")] {
            let err = claim(&mut Vec::new(), &mut ledger, &claim_args("petrol", dec!(30), proof))
                .unwrap_err();
            let err = err.downcast_ref::<LedgerError>().unwrap();
            assert_eq!(err.as_validation(), Some(&ValidationError::MissingProof));
        }
        assert_eq!(ledger.balance(&DriverId::from(1001_u64)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn other_claim_needs_description() {
        let (mut ledger, _clock) = ledger();
        let mut args = claim_args("other", dec!(8), Some("photo-2"));
        let err = claim(&mut Vec::new(), &mut ledger, &args).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ValidationError>(),
            Some(&ValidationError::MissingDescription)
        );

        args.description = Some("parking".to_string());
        let mut output = Vec::new();
        claim(&mut output, &mut ledger, &args).unwrap();
        assert_snapshot!(text(output), @r"
        Claim recorded: parking 8.00 on 2025-03-03
        Balance: -8.00
        ");
    }

    #[test]
    fn topup_requires_admin() {
        let (mut ledger, _clock) = ledger();
        let err = topup(&mut Vec::new(), &mut ledger, &admin_config(), &topup_args(5, dec!(10)))
            .unwrap_err();
        assert!(err.to_string().contains("not authorized"));
        assert_eq!(ledger.balance(&DriverId::from(1001_u64)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn topup_rejects_zero_amount() {
        let (mut ledger, _clock) = ledger();
        let err = topup(&mut Vec::new(), &mut ledger, &admin_config(), &topup_args(9, dec!(0)))
            .unwrap_err();
        let err = err.downcast_ref::<LedgerError>().unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn balances_lists_accounts() {
        let (mut ledger, _clock) = ledger();
        ledger
            .register_driver(&DriverProfile {
                id: DriverId::from(1001_u64),
                username: Some("lorry_king".to_string()),
                first_name: None,
            })
            .unwrap();
        claim(&mut Vec::new(), &mut ledger, &claim_args("toll", dec!(12.4), Some("p"))).unwrap();
        ledger.register_driver(&DriverProfile::new(DriverId::from(2_u64))).unwrap();

        let mut output = Vec::new();
        balances(&mut output, &ledger).unwrap();
        assert_snapshot!(text(output), @"1001         @lorry_king                  -12.40");
    }

    #[test]
    fn claims_are_paginated() {
        let (mut ledger, _clock) = ledger();
        for (day, amount) in [("5 days ago", dec!(1)), ("3 days ago", dec!(2)), ("today", dec!(3))]
        {
            let mut args = claim_args("toll", amount, Some("p"));
            args.date = day.to_string();
            claim(&mut Vec::new(), &mut ledger, &args).unwrap();
        }

        let mut output = Vec::new();
        let args = ClaimsArgs {
            driver: None,
            page: 1,
            per_page: 2,
        };
        claims(&mut output, &ledger, &args).unwrap();
        assert_snapshot!(text(output), @r"
        Claims (page 1 of 2, 3 total)
        2025-03-03  User 1001  toll  3.00  proof: p
        2025-02-28  User 1001  toll  2.00  proof: p
        More: --page 2
        ");
    }

    #[test]
    fn claims_empty_history() {
        let (ledger, _clock) = ledger();
        let mut output = Vec::new();
        let args = ClaimsArgs {
            driver: Some(DriverId::from(3_u64)),
            page: 1,
            per_page: 5,
        };
        claims(&mut output, &ledger, &args).unwrap();
        assert_snapshot!(text(output), @"No claims recorded.");
    }
}
