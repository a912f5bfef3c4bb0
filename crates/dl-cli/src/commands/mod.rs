//! CLI subcommand implementations.

use clap::Args;
use dl_core::DriverId;

pub mod account;
pub mod attendance;
pub mod drivers;
pub mod export;
pub mod salary;
pub mod summary;
pub mod util;

/// Selects the driver a command acts for.
#[derive(Debug, Clone, Args)]
pub struct DriverArgs {
    /// Driver ID (the messaging platform's user ID).
    #[arg(long, value_parser = util::parse_driver_id)]
    pub driver: DriverId,
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use dl_core::{DriverId, FixedClock, Ledger, LedgerSettings, MemoryStore};

    use super::DriverArgs;

    pub type TestLedger = Ledger<MemoryStore, Arc<FixedClock>>;

    /// A ledger whose clock reads 2025-03-03 09:00 in Kuala Lumpur.
    pub fn ledger() -> (TestLedger, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 3, 1, 0, 0).unwrap(),
        ));
        let ledger = Ledger::with_clock(
            MemoryStore::new(),
            Arc::clone(&clock),
            LedgerSettings::default(),
        );
        (ledger, clock)
    }

    pub fn driver_args(id: u64) -> DriverArgs {
        DriverArgs {
            driver: DriverId::from(id),
        }
    }

    pub fn text(output: Vec<u8>) -> String {
        String::from_utf8(output).unwrap()
    }
}
