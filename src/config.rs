//! Service configuration.
//!
//! Loaded once at start-up from (later sources override earlier ones):
//! 1. an optional `pedidos.{yaml,toml,json}` file in the working directory
//! 2. an optional file named by `PEDIDOS_CONFIG`
//! 3. environment variables prefixed `PEDIDOS`, nested with `__`
//!    (e.g. `PEDIDOS__DB__HOST`, `PEDIDOS__INVENTORY__BASE_URL`)

use std::time::Duration;

use ::config::ConfigError;
use serde::Deserialize;

use crate::domain::order::DecrementClaim;

/// Base name of the optional configuration file in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pedidos";
/// Environment variable naming an extra configuration file.
pub const CONFIG_ENV_VAR: &str = "PEDIDOS_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "PEDIDOS";
/// Upper bound for every `*_secs` setting.
pub const MAX_DURATION_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub db: DbSettings,
    pub inventory: InventorySettings,
    pub orders: OrderSettings,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        use ::config::{Config, Environment, File};

        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // A zero here disables the timeout (Postgres) or makes every call fail.
        for (key, secs) in [
            ("db.connect_timeout_secs", self.db.connect_timeout_secs),
            ("db.statement_timeout_secs", self.db.statement_timeout_secs),
            ("inventory.timeout_secs", self.inventory.timeout_secs),
        ] {
            if secs == 0 {
                return Err(invalid(key, "must be at least 1 second"));
            }
        }
        for (key, secs) in [
            ("db.connect_timeout_secs", self.db.connect_timeout_secs),
            ("db.statement_timeout_secs", self.db.statement_timeout_secs),
            ("inventory.timeout_secs", self.inventory.timeout_secs),
            ("inventory.retry.interval_secs", self.inventory.retry.interval_secs),
            ("inventory.retry.stale_after_secs", self.inventory.retry.stale_after_secs),
        ] {
            if secs > MAX_DURATION_SECS {
                return Err(invalid(
                    key,
                    &format!("must be at most {} seconds, got {}", MAX_DURATION_SECS, secs),
                ));
            }
        }
        if self.db.pool_size == 0 {
            return Err(invalid("db.pool_size", "must be positive"));
        }
        if self.inventory.retry.max_attempts < 1 {
            return Err(invalid("inventory.retry.max_attempts", "must be positive"));
        }
        if self.inventory.retry.batch_size < 1 {
            return Err(invalid("inventory.retry.batch_size", "must be positive"));
        }
        Ok(())
    }

    /// How long a request owns the decrements of the order it just created.
    ///
    /// Each line costs at most one inventory call plus recording its outcome,
    /// which is a pool checkout and up to two statements.
    /// `inventory.retry.stale_after_secs` is added on top as slack.
    pub fn decrement_claim(&self) -> DecrementClaim {
        let per_line = bounded_secs(self.inventory.timeout_secs)
            + bounded_secs(self.db.connect_timeout_secs)
            + bounded_secs(self.db.statement_timeout_secs) * 2;
        DecrementClaim {
            per_line,
            grace: bounded_secs(self.inventory.retry.stale_after_secs),
        }
    }
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::Message(format!("{} {}", key, reason))
}

fn bounded_secs(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(secs.min(MAX_DURATION_SECS) as i64)
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8001,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub sslmode: String,
    /// Full connection string; takes precedence over the individual fields.
    pub url: Option<String>,
    pub pool_size: u32,
    pub connect_timeout_secs: u64,
    pub statement_timeout_secs: u64,
}

impl Default for DbSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "bd_api_pedidos".to_string(),
            sslmode: "prefer".to_string(),
            url: None,
            pool_size: 10,
            connect_timeout_secs: 5,
            statement_timeout_secs: 10,
        }
    }
}

impl DbSettings {
    /// libpq connection string for these settings.
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "host={} port={} user={} password={} dbname={} sslmode={}",
            quote_conninfo(&self.host),
            self.port,
            quote_conninfo(&self.user),
            quote_conninfo(&self.password),
            quote_conninfo(&self.name),
            quote_conninfo(&self.sslmode),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

fn quote_conninfo(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}'", escaped)
}

/// Shape of the inventory service's product response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductEnvelope {
    /// `{"producto": {"id", "nombre", "inventario", "precio"}}`
    #[default]
    Nested,
    /// `{"id", "nombre", "inventario", "precio"}`
    Flat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InventorySettings {
    #[serde(alias = "baseUrl", alias = "baseurl")]
    pub base_url: String,
    pub timeout_secs: u64,
    pub envelope: ProductEnvelope,
    pub retry: RetrySettings,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            base_url: "http://productos:8000".to_string(),
            timeout_secs: 5,
            envelope: ProductEnvelope::Nested,
            retry: RetrySettings::default(),
        }
    }
}

impl InventorySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Background retry of stock decrements that failed after the order was
/// committed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub max_attempts: i32,
    /// Slack added to a request's claim on its decrements. Once the claim
    /// runs out the request is presumed dead and the relay takes over.
    pub stale_after_secs: u64,
    pub batch_size: i64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            max_attempts: 5,
            stale_after_secs: 60,
            batch_size: 50,
        }
    }
}

impl RetrySettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderSettings {
    /// Accept orders without lines.
    pub allow_empty: bool,
}

impl Default for OrderSettings {
    fn default() -> Self {
        Self { allow_empty: true }
    }
}
