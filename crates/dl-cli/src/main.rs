use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use dl_core::Ledger;
use tracing_subscriber::EnvFilter;

use dl_cli::commands::{account, attendance, drivers, export, salary, summary};
use dl_cli::{Cli, Commands, Config};

/// Load config and open the ledger, ensuring the database directory exists.
fn open_ledger(config_path: Option<&Path>) -> Result<(Ledger<dl_db::Database>, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let settings = config.settings().context("invalid configuration")?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = dl_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((Ledger::new(db, settings), config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut ledger, config) = open_ledger(cli.config.as_deref())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Register(args) => drivers::register(&mut out, &mut ledger, args)?,
        Commands::Drivers => drivers::list(&mut out, &ledger)?,
        Commands::ClockIn(args) => attendance::clock_in(&mut out, &mut ledger, args)?,
        Commands::ClockOut(args) => attendance::clock_out(&mut out, &mut ledger, args)?,
        Commands::OffDay(args) => attendance::off_day(&mut out, &mut ledger, args)?,
        Commands::Check(args) => attendance::check(&mut out, &ledger, args)?,
        Commands::Claim(args) => account::claim(&mut out, &mut ledger, args)?,
        Commands::Topup(args) => account::topup(&mut out, &mut ledger, &config, args)?,
        Commands::Balance(args) => account::balance(&mut out, &ledger, args)?,
        Commands::Balances => account::balances(&mut out, &ledger)?,
        Commands::Claims(args) => account::claims(&mut out, &ledger, args)?,
        Commands::Salary(args) => salary::run(&mut out, &mut ledger, &config, args)?,
        Commands::Summary(args) => summary::run(&mut out, &ledger, args)?,
        Commands::Export => export::run(&mut out, &ledger)?,
    }

    out.flush()?;
    Ok(())
}
