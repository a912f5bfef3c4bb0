//! Export command: dumps every driver's records as JSON.

use std::io::Write;

use anyhow::Result;
use dl_core::{Clock, Ledger, LedgerStore};

pub fn run<W: Write, S: LedgerStore, C: Clock>(
    writer: &mut W,
    ledger: &Ledger<S, C>,
) -> Result<()> {
    let export = ledger.export()?;
    tracing::debug!(drivers = export.drivers.len(), "exporting ledger");
    writeln!(writer, "{}", serde_json::to_string_pretty(&export)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{driver_args, ledger};

    use chrono::Duration;

    #[test]
    fn export_includes_every_driver() {
        let (mut ledger, clock) = ledger();
        let first = driver_args(1001).driver;
        ledger.clock_in(&first).unwrap();
        clock.advance(Duration::hours(2));
        ledger.clock_out(&first).unwrap();
        ledger.mark_off_today(&driver_args(2).driver).unwrap();

        let mut output = Vec::new();
        run(&mut output, &ledger).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["timezone"], "Asia/Kuala_Lumpur");
        let drivers = value["drivers"].as_array().unwrap();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0]["attendance"].as_array().unwrap().len(), 1);
        assert!(drivers[1]["salary"].is_null());
    }

    #[test]
    fn export_of_empty_ledger() {
        let (ledger, _clock) = ledger();
        let mut output = Vec::new();
        run(&mut output, &ledger).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["drivers"], serde_json::json!([]));
    }
}
