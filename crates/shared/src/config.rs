//! Application configuration management.

use std::path::PathBuf;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Maximum allowed difference between total debits and total credits.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
    /// Optional JSON file holding a versioned account-type permission table.
    /// The built-in table is used when unset.
    #[serde(default)]
    pub permissions_path: Option<PathBuf>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            balance_tolerance: default_balance_tolerance(),
            permissions_path: None,
        }
    }
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

fn default_filter() -> String {
    "tally=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "TALLY__LEDGER__BALANCE_TOLERANCE",
                "TALLY__LEDGER__PERMISSIONS_PATH",
                "TALLY__LOGGING__FILTER",
                "TALLY__LOGGING__JSON",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.balance_tolerance, dec!(0.001));
                assert!(config.ledger.permissions_path.is_none());
                assert_eq!(config.logging.filter, "tally=info");
                assert!(!config.logging.json);
            },
        );
    }

    #[test]
    fn test_environment_overrides() {
        temp_env::with_vars(
            [
                ("TALLY__LEDGER__BALANCE_TOLERANCE", Some("0.01")),
                ("TALLY__LEDGER__PERMISSIONS_PATH", Some("/etc/tally/permissions.json")),
                ("TALLY__LOGGING__FILTER", Some("tally=debug")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.ledger.balance_tolerance, dec!(0.01));
                assert_eq!(
                    config.ledger.permissions_path,
                    Some(PathBuf::from("/etc/tally/permissions.json"))
                );
                assert_eq!(config.logging.filter, "tally=debug");
            },
        );
    }
}
