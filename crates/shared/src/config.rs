//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Period closing rules.
    #[serde(default)]
    pub closing: ClosingConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations at startup.
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Accounts and tolerance used when closing a period.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosingConfig {
    /// Account credited with a profit.
    #[serde(default = "default_profit_account")]
    pub profit_account: String,
    /// Account debited with a loss.
    #[serde(default = "default_loss_account")]
    pub loss_account: String,
    /// Maximum accepted gap between total debits and total credits.
    #[serde(default = "default_balance_tolerance")]
    pub balance_tolerance: Decimal,
}

impl Default for ClosingConfig {
    fn default() -> Self {
        Self {
            profit_account: default_profit_account(),
            loss_account: default_loss_account(),
            balance_tolerance: default_balance_tolerance(),
        }
    }
}

fn default_profit_account() -> String {
    "120".to_string()
}

fn default_loss_account() -> String {
    "129".to_string()
}

fn default_balance_tolerance() -> Decimal {
    Decimal::new(1, 2) // 0.01
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "closebook=info,closebook_core=info,closebook_db=info,closebook_api=info,tower_http=info".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLOSEBOOK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field rules the deserializer cannot express.
    pub fn validate(&self) -> AppResult<()> {
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::Configuration(format!(
                "database.min_connections ({}) exceeds database.max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        for (key, account) in [
            ("closing.profit_account", &self.closing.profit_account),
            ("closing.loss_account", &self.closing.loss_account),
        ] {
            if !account.starts_with('1') || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::Configuration(format!(
                    "{key} must be a class 1 account number, got {account:?}"
                )));
            }
        }

        if self.closing.balance_tolerance.is_sign_negative() {
            return Err(AppError::Configuration(
                "closing.balance_tolerance must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn from_overrides(pairs: &[(&str, &str)]) -> AppConfig {
        let mut builder = config::Config::builder();
        for (key, value) in pairs {
            builder = builder.set_override(*key, *value).unwrap();
        }
        builder.build().unwrap().try_deserialize().unwrap()
    }

    #[test]
    fn test_defaults_apply_when_only_url_is_set() {
        let config = from_overrides(&[("database.url", "postgres://localhost/closebook")]);

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.max_connections, 10);
        assert!(!config.database.run_migrations);
        assert_eq!(config.closing.profit_account, "120");
        assert_eq!(config.closing.loss_account, "129");
        assert_eq!(config.closing.balance_tolerance, dec!(0.01));
        assert!(!config.log.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_closing_overrides() {
        let config = from_overrides(&[
            ("database.url", "postgres://localhost/closebook"),
            ("closing.profit_account", "1200"),
            ("closing.balance_tolerance", "0.05"),
        ]);

        assert_eq!(config.closing.profit_account, "1200");
        assert_eq!(config.closing.balance_tolerance, dec!(0.05));
    }

    #[test]
    fn test_validate_rejects_non_equity_result_account() {
        let mut config = from_overrides(&[("database.url", "postgres://localhost/closebook")]);
        config.closing.loss_account = "659".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("closing.loss_account"));
    }

    #[test]
    fn test_validate_rejects_inverted_pool_bounds() {
        let mut config = from_overrides(&[("database.url", "postgres://localhost/closebook")]);
        config.database.min_connections = 20;

        assert!(matches!(
            config.validate(),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_reads_prefixed_environment() {
        temp_env::with_vars(
            [
                ("CLOSEBOOK__DATABASE__URL", Some("postgres://env/closebook")),
                ("CLOSEBOOK__SERVER__PORT", Some("9090")),
                ("CLOSEBOOK__LOG__JSON", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://env/closebook");
                assert_eq!(config.server.port, 9090);
                assert!(config.log.json);
            },
        );
    }
}
