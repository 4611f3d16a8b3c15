//! Connection descriptor resolution.
//!
//! Turns [`DatabaseConfig`] into one connection URI plus the backend it points at.
//! A configured URI always wins over the discrete host/user/... fields.

use std::borrow::Cow;

use snakes_common::config::DatabaseConfig;
use url::Url;

/// Configuration problems detected before any connection attempt.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("no database configured: set DATABASE_URL or DB_HOST/DB_USER/DB_PASSWORD/DB_NAME")]
    Missing,

    #[error("unsupported database scheme '{0}' (expected mysql, mariadb, postgres or sqlite)")]
    UnsupportedScheme(String),

    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid database credentials in configuration")]
    InvalidCredentials,
}

/// The store dialect behind a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Postgres,
    Sqlite,
}

impl Backend {
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Rewrite `?` placeholders into the backend's native form.
    ///
    /// Statements are written MySQL/SQLite style. PostgreSQL wants `$1`, `$2`, ...
    /// Question marks inside quoted literals or identifiers are left alone.
    pub fn rewrite_placeholders(self, sql: &str) -> Cow<'_, str> {
        if self != Self::Postgres || !sql.contains('?') {
            return Cow::Borrowed(sql);
        }

        let mut out = String::with_capacity(sql.len() + 8);
        let mut quote: Option<char> = None;
        let mut n = 0;
        for c in sql.chars() {
            match (quote, c) {
                (None, '\'' | '"') => {
                    quote = Some(c);
                    out.push(c);
                }
                (Some(q), _) if c == q => {
                    quote = None;
                    out.push(c);
                }
                (None, '?') => {
                    n += 1;
                    out.push('$');
                    out.push_str(&n.to_string());
                }
                _ => out.push(c),
            }
        }
        Cow::Owned(out)
    }
}

/// A resolved connection URI.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub url: String,
    pub backend: Backend,
}

impl Descriptor {
    /// Resolve the descriptor from configuration, applying the TLS requirement.
    pub fn resolve(config: &DatabaseConfig) -> Result<Self, DescriptorError> {
        let raw = match config.url() {
            Some(url) => url.to_owned(),
            None if config.has_discrete_fields() => from_fields(config)?,
            None => return Err(DescriptorError::Missing),
        };

        let scheme = raw.split_once(':').map(|(s, _)| s).unwrap_or_default();
        let backend = Backend::from_scheme(scheme)
            .ok_or_else(|| DescriptorError::UnsupportedScheme(scheme.to_owned()))?;

        let url = if config.ssl {
            require_tls(&raw, backend)?
        } else {
            raw
        };

        Ok(Self { url, backend })
    }

    /// The URI with any password masked, safe to log.
    pub fn redacted(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) if url.password().is_some() => {
                let _ = url.set_password(Some("***"));
                url.to_string()
            }
            _ => self.url.clone(),
        }
    }
}

fn from_fields(config: &DatabaseConfig) -> Result<String, DescriptorError> {
    let backend = Backend::from_scheme(&config.driver)
        .ok_or_else(|| DescriptorError::UnsupportedScheme(config.driver.clone()))?;

    if backend == Backend::Sqlite {
        let path = config.name.as_deref().unwrap_or(":memory:");
        return Ok(format!("sqlite://{path}"));
    }

    let host = config.host.as_deref().unwrap_or("localhost");
    let mut url = Url::parse(&format!("{}://{host}", backend.name()))?;
    url.set_port(config.port)
        .map_err(|_| DescriptorError::InvalidCredentials)?;
    if let Some(user) = config.user.as_deref() {
        url.set_username(user)
            .map_err(|_| DescriptorError::InvalidCredentials)?;
    }
    if let Some(password) = config.password.as_deref() {
        url.set_password(Some(password))
            .map_err(|_| DescriptorError::InvalidCredentials)?;
    }
    if let Some(name) = config.name.as_deref() {
        url.set_path(name);
    }
    Ok(url.to_string())
}

fn require_tls(raw: &str, backend: Backend) -> Result<String, DescriptorError> {
    let (key, value) = match backend {
        Backend::Postgres => ("sslmode", "require"),
        Backend::MySql => ("ssl-mode", "required"),
        Backend::Sqlite => {
            tracing::warn!("database.ssl is set but SQLite has no transport; ignoring");
            return Ok(raw.to_owned());
        }
    };

    let mut url = Url::parse(raw)?;
    if !url.query_pairs().any(|(k, _)| k == key) {
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url.to_string())
}
