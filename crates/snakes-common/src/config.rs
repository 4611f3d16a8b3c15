//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: flat env vars (`DATABASE_URL`, `PORT`, ...) > `SNAKES_*` env vars
//! > config.toml > defaults
//!
//! The loaded [`AppConfig`] is returned to the caller and passed around explicitly;
//! there is no process-global copy.

use serde::Deserialize;
use std::time::Duration;

/// Conventional flat environment variables and the config keys they override.
///
/// These are the names existing deployments already export, so they win over the
/// namespaced `SNAKES_SECTION__KEY` form.
const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("HOST", "server.host"),
    ("PORT", "server.port"),
    ("DATABASE_URL", "database.url"),
    ("DB_DRIVER", "database.driver"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.user"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.name"),
    ("DB_POOL_SIZE", "database.max_connections"),
    ("DB_SSL", "database.ssl"),
];

/// Load the configuration from `.env`, `config.toml` and the process environment.
pub fn load() -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    load_with(|name| std::env::var(name).ok())
}

/// Load the configuration, resolving flat variables through `lookup`.
///
/// Split out from [`load`] so the override rules can be exercised without touching
/// the process environment.
pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 3000)?
        .set_default("server.environment", "development")?
        .set_default("database.driver", "mysql")?
        .set_default("database.mode", "pool")?
        .set_default("database.max_connections", 10)?
        .set_default("database.min_connections", 0)?
        .set_default("database.connect_timeout_secs", 30)?
        .set_default("database.acquire_timeout_secs", 30)?
        .set_default("database.ssl", false)?
        .set_default("database.reprobe_on_failure", true)?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (SNAKES_SERVER__PORT, SNAKES_DATABASE__MODE, etc.)
        .add_source(
            config::Environment::with_prefix("SNAKES")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    for (var, key) in FLAT_ENV_OVERRIDES {
        builder = builder.set_override_option(*key, non_empty(lookup(var)))?;
    }

    let environment = non_empty(lookup("APP_ENV")).or_else(|| non_empty(lookup("NODE_ENV")));
    builder = builder.set_override_option("server.environment", environment)?;

    builder.build()?.try_deserialize()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Free-form deployment label echoed by `GET /api/test`.
    pub environment: String,
}

/// How the service holds its connection(s) to the store.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    /// A bounded pool; each query borrows a connection and returns it.
    Pool,
    /// One long-lived connection shared behind a mutex.
    Single,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Full connection URI. Takes precedence over the discrete fields below.
    pub url: Option<String>,
    /// Scheme used when building a URI from the discrete fields
    /// (`mysql`, `postgres` or `sqlite`).
    pub driver: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub mode: ConnectionMode,
    /// Exit at startup when the store is unconfigured or unreachable.
    /// Unset means "pick the mode's default", see [`DatabaseConfig::fail_fast`].
    pub fail_fast: Option<bool>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bound on opening a connection. In pool mode connections are opened
    /// inside an acquire, so see [`DatabaseConfig::pool_acquire_timeout`].
    pub connect_timeout_secs: u64,
    /// Bound on waiting for a pooled connection or the single-mode lock.
    pub acquire_timeout_secs: u64,
    /// Require TLS to the store.
    pub ssl: bool,
    /// Re-run the diagnostic query after a failed request query, for logging only.
    pub reprobe_on_failure: bool,
}

impl DatabaseConfig {
    /// Effective startup policy. Single-connection deployments cannot serve anything
    /// without their one connection, so they fail fast unless told otherwise; pooled
    /// deployments start degraded.
    pub fn fail_fast(&self) -> bool {
        self.fail_fast.unwrap_or(match self.mode {
            ConnectionMode::Pool => false,
            ConnectionMode::Single => true,
        })
    }

    /// The configured URI, ignoring blank values.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    /// Whether enough discrete fields are present to build a URI.
    pub fn has_discrete_fields(&self) -> bool {
        self.host.as_deref().is_some_and(|h| !h.trim().is_empty())
            || (self.driver == "sqlite" && self.name.is_some())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Wait bound for a pooled connection. A pool opens connections inside an
    /// acquire, so the wait honors whichever of the two timeouts is shorter.
    pub fn pool_acquire_timeout(&self) -> Duration {
        self.connect_timeout().min(self.acquire_timeout())
    }
}
