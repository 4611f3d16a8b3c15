//! # snakes-db
//!
//! Database layer for the snakes service. Owns the one connectivity resource the
//! process holds for its lifetime:
//! - **pool** mode: a lazily-connected pool; each query borrows a connection
//!   and the guard hands it back on every path
//! - **single** mode: one connection behind an async mutex
//! - **disconnected**: no usable descriptor or no reachable store at startup, and
//!   the startup policy said to keep going; every query fails
//!
//! MySQL and PostgreSQL use their native sqlx drivers; SQLite goes through
//! `sqlx::Any`.

mod connection;
pub mod descriptor;
pub mod repository;
pub mod rows;

use std::sync::Arc;
use std::time::Duration;

use snakes_common::config::{ConnectionMode, DatabaseConfig};
use snakes_common::error::QueryFailure;
use tokio::sync::Mutex;

use connection::{Conn, Pool};

pub use rows::JsonRow;
pub use descriptor::{Backend, Descriptor, DescriptorError};

/// Statement used to check reachability. Reads no application data.
pub const DIAGNOSTIC_QUERY: &str = "SELECT 1";

/// Startup failures. Whether they are fatal is decided by `database.fail_fast`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database configuration error: {0}")]
    Configuration(#[from] DescriptorError),

    #[error("could not reach the database: {0}")]
    Connection(#[from] QueryFailure),
}

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Text(String),
}

impl Param {
    /// Bind a path segment: decimal integers go over the wire as integers, anything
    /// else as text so the store applies its own coercion.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(v) => Self::Int(v),
            Err(_) => Self::Text(raw.to_owned()),
        }
    }
}

enum Connectivity {
    Pool(Pool),
    Single {
        conn: Mutex<Option<Conn>>,
        acquire_timeout: Duration,
    },
    Disconnected {
        reason: String,
    },
}

struct Inner {
    conn: Connectivity,
    backend: Option<Backend>,
}

/// Shared database handle passed through Axum state. Cloning is cheap and every
/// clone refers to the same connectivity resource.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Open the connectivity resource and run the startup probe.
    ///
    /// With `fail_fast` off, configuration and connection problems are logged and
    /// the returned handle serves degraded health instead of failing.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StartupError> {
        sqlx::any::install_default_drivers();
        let fail_fast = config.fail_fast();

        let db = match Self::open(config).await {
            Ok(db) => db,
            Err(err) if fail_fast => return Err(err),
            Err(err) => {
                tracing::warn!("Starting without a database: {err}");
                return Ok(Self::disconnected(err.to_string()));
            }
        };

        match db.probe().await {
            Ok(()) => tracing::info!("Database reachable"),
            Err(err) if fail_fast => {
                db.shutdown().await;
                return Err(StartupError::Connection(err));
            }
            Err(err) => {
                tracing::warn!("Database unreachable at startup, serving degraded health: {err}");
            }
        }

        Ok(db)
    }

    async fn open(config: &DatabaseConfig) -> Result<Self, StartupError> {
        let descriptor = Descriptor::resolve(config)?;
        tracing::info!(
            backend = descriptor.backend.name(),
            mode = ?config.mode,
            "Connecting to {}",
            descriptor.redacted()
        );

        let conn = match config.mode {
            ConnectionMode::Pool => {
                let pool = Pool::connect_lazy(descriptor.backend, &descriptor.url, config)
                    .map_err(QueryFailure::from)?;
                Connectivity::Pool(pool)
            }
            ConnectionMode::Single => {
                let conn = tokio::time::timeout(
                    config.connect_timeout(),
                    Conn::connect(descriptor.backend, &descriptor.url),
                )
                .await
                .map_err(|_| {
                    QueryFailure::new(format!(
                        "connect timed out after {}s",
                        config.connect_timeout_secs
                    ))
                })?
                .map_err(QueryFailure::from)?;
                tracing::info!("Connected to {}", descriptor.backend.name());
                Connectivity::Single {
                    conn: Mutex::new(Some(conn)),
                    acquire_timeout: config.acquire_timeout(),
                }
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                conn,
                backend: Some(descriptor.backend),
            }),
        })
    }

    /// A handle on which every query fails with `reason`.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                conn: Connectivity::Disconnected {
                    reason: reason.into(),
                },
                backend: None,
            }),
        }
    }

    pub fn backend(&self) -> Option<Backend> {
        self.inner.backend
    }

    /// Execute one parameterized statement and return its rows in store order.
    ///
    /// Statements use `?` placeholders; values are always bound, never spliced.
    pub async fn execute(
        &self,
        statement: &str,
        params: &[Param],
    ) -> Result<Vec<JsonRow>, QueryFailure> {
        let backend = self.inner.backend.unwrap_or(Backend::MySql);
        let sql = backend.rewrite_placeholders(statement);

        let rows = match &self.inner.conn {
            Connectivity::Pool(pool) => pool.fetch(&sql, params).await?,
            Connectivity::Single {
                conn,
                acquire_timeout,
            } => {
                let mut guard = tokio::time::timeout(*acquire_timeout, conn.lock())
                    .await
                    .map_err(|_| QueryFailure::new("timed out waiting for the database connection"))?;
                let conn = guard
                    .as_mut()
                    .ok_or_else(|| QueryFailure::new("database connection is closed"))?;
                conn.fetch(&sql, params).await?
            }
            Connectivity::Disconnected { reason } => {
                return Err(QueryFailure::new(format!(
                    "database is not connected: {reason}"
                )));
            }
        };

        Ok(rows)
    }

    async fn probe(&self) -> Result<(), QueryFailure> {
        self.execute(DIAGNOSTIC_QUERY, &[]).await.map(drop)
    }

    /// Health check: verify the database is reachable. Never fails; problems are
    /// logged and reported as `false`.
    pub async fn check_health(&self) -> bool {
        match self.probe().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(code = ?err.code, "Database health check failed: {err}");
                false
            }
        }
    }

    /// Close the connectivity resource. Later queries fail; nothing reconnects.
    pub async fn shutdown(&self) {
        match &self.inner.conn {
            Connectivity::Pool(pool) => pool.close().await,
            Connectivity::Single { conn, .. } => {
                if let Some(conn) = conn.lock().await.take() {
                    if let Err(err) = conn.close().await {
                        tracing::warn!("Error closing database connection: {err}");
                    }
                }
            }
            Connectivity::Disconnected { .. } => {}
        }
        tracing::info!("Database connection closed");
    }
}
