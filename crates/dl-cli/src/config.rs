//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use chrono_tz::Tz;
use dl_core::{AdminId, BusinessCalendar, LedgerSettings, RateConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// IANA name of the business timezone that decides what "today" is.
    pub timezone: String,
    pub working_days_per_month: u32,
    pub working_hours_per_day: u32,
    /// Hourly rate for drivers without a monthly salary.
    pub default_hourly_rate: Decimal,
    /// Callers allowed to top up balances and set salaries.
    pub admin_ids: Vec<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("timezone", &self.timezone)
            .field("working_days_per_month", &self.working_days_per_month)
            .field("working_hours_per_day", &self.working_hours_per_day)
            .field("default_hourly_rate", &self.default_hourly_rate)
            .field("admin_count", &self.admin_ids.len())
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        let rates = RateConfig::default();
        Self {
            database_path: data_dir.join("ledger.db"),
            timezone: BusinessCalendar::default().timezone().name().to_string(),
            working_days_per_month: rates.working_days_per_month,
            working_hours_per_day: rates.working_hours_per_day,
            default_hourly_rate: rates.default_hourly_rate,
            admin_ids: Vec::new(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DL_*)
        figment = figment.merge(Env::prefixed("DL_"));

        figment.extract()
    }

    /// Checks the values and builds the ledger's business settings.
    pub fn settings(&self) -> anyhow::Result<LedgerSettings> {
        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|err| anyhow::anyhow!("{err}"))
            .with_context(|| format!("unknown timezone {:?}", self.timezone))?;
        if self.working_days_per_month == 0 || self.working_hours_per_day == 0 {
            bail!("working_days_per_month and working_hours_per_day must be greater than zero");
        }
        if self.default_hourly_rate <= Decimal::ZERO {
            bail!(
                "default_hourly_rate must be greater than zero, got {}",
                self.default_hourly_rate
            );
        }
        Ok(LedgerSettings {
            calendar: BusinessCalendar::new(tz),
            rates: RateConfig {
                working_days_per_month: self.working_days_per_month,
                working_hours_per_day: self.working_hours_per_day,
                default_hourly_rate: self.default_hourly_rate,
            },
        })
    }

    pub fn is_admin(&self, caller: &AdminId) -> bool {
        self.admin_ids.iter().any(|id| id.trim() == caller.as_str())
    }

    /// Fails unless `caller` is listed in `admin_ids`.
    pub fn require_admin(&self, caller: &AdminId) -> anyhow::Result<()> {
        if !self.is_admin(caller) {
            tracing::warn!(%caller, "rejected admin command from non-admin");
            bail!("{caller} is not authorized to run admin commands");
        }
        Ok(())
    }
}

/// Returns the platform-specific config directory for the ledger.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("driver-ledger"))
}

/// Returns the platform-specific data directory for the ledger.
///
/// On Linux: `~/.local/share/driver-ledger`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("driver-ledger"))
}
