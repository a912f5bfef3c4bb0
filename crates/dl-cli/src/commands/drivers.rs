//! Driver registry commands.

use std::io::Write;

use anyhow::Result;
use clap::Args;
use dl_core::{Clock, DriverProfile, Ledger, LedgerStore};

use super::DriverArgs;

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub driver: DriverArgs,
    /// Messaging platform username, without the leading `@`.
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub first_name: Option<String>,
}

/// Creates or updates a driver's profile.
pub fn register<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &mut Ledger<S, C>,
    args: &RegisterArgs,
) -> Result<()> {
    let profile = DriverProfile {
        id: args.driver.driver.clone(),
        username: args
            .username
            .as_deref()
            .map(|name| name.trim().trim_start_matches('@').to_string()),
        first_name: args.first_name.clone(),
    };
    ledger.register_driver(&profile)?;
    writeln!(writer, "Registered {} ({})", profile.display_name(), profile.id)?;
    Ok(())
}

pub fn list<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
) -> Result<()> {
    let drivers = ledger.drivers()?;
    if drivers.is_empty() {
        writeln!(writer, "No drivers yet.")?;
        return Ok(());
    }
    for profile in drivers {
        writeln!(writer, "{:<12} {}", profile.id.as_str(), profile.display_name())?;
    }
    Ok(())
}
