//! Native driver handles behind the connectivity resource.
//!
//! MySQL and PostgreSQL use their own sqlx drivers so every column type the
//! store reports can be decoded. SQLite goes through `sqlx::Any`.

use snakes_common::config::DatabaseConfig;
use sqlx::pool::PoolOptions;
use sqlx::query::Query;
use sqlx::{
    AnyConnection, AnyPool, Connection, Encode, MySql, MySqlConnection, MySqlPool, PgConnection,
    PgPool, Postgres, Type,
};

use crate::rows::{self, JsonRow};
use crate::{Backend, Param};

/// A lazily-connected pool.
pub(crate) enum Pool {
    MySql(MySqlPool),
    Postgres(PgPool),
    Sqlite(AnyPool),
}

impl Pool {
    /// No connection is attempted until the first query.
    pub(crate) fn connect_lazy(
        backend: Backend,
        url: &str,
        config: &DatabaseConfig,
    ) -> Result<Self, sqlx::Error> {
        Ok(match backend {
            Backend::MySql => Self::MySql(options(config).connect_lazy(url)?),
            Backend::Postgres => Self::Postgres(options(config).connect_lazy(url)?),
            Backend::Sqlite => Self::Sqlite(options(config).connect_lazy(url)?),
        })
    }

    /// Run one statement on a borrowed connection; the connection goes back to
    /// the pool when dropped, on success or error.
    pub(crate) async fn fetch(&self, sql: &str, params: &[Param]) -> Result<Vec<JsonRow>, sqlx::Error> {
        match self {
            Self::MySql(pool) => {
                let mut conn = pool.acquire().await?;
                let rows = bind(sqlx::query::<MySql>(sql), params)
                    .fetch_all(&mut *conn)
                    .await?;
                rows::mysql::rows_to_json(&rows)
            }
            Self::Postgres(pool) => {
                let mut conn = pool.acquire().await?;
                let rows = bind(sqlx::query::<Postgres>(sql), params)
                    .fetch_all(&mut *conn)
                    .await?;
                rows::postgres::rows_to_json(&rows)
            }
            Self::Sqlite(pool) => {
                let mut conn = pool.acquire().await?;
                let rows = bind(sqlx::query::<sqlx::Any>(sql), params)
                    .fetch_all(&mut *conn)
                    .await?;
                rows::any::rows_to_json(&rows)
            }
        }
    }

    pub(crate) async fn close(&self) {
        match self {
            Self::MySql(pool) => pool.close().await,
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}

/// The one dedicated connection of single mode.
pub(crate) enum Conn {
    MySql(MySqlConnection),
    Postgres(PgConnection),
    Sqlite(AnyConnection),
}

impl Conn {
    pub(crate) async fn connect(backend: Backend, url: &str) -> Result<Self, sqlx::Error> {
        Ok(match backend {
            Backend::MySql => Self::MySql(MySqlConnection::connect(url).await?),
            Backend::Postgres => Self::Postgres(PgConnection::connect(url).await?),
            Backend::Sqlite => Self::Sqlite(AnyConnection::connect(url).await?),
        })
    }

    pub(crate) async fn fetch(&mut self, sql: &str, params: &[Param]) -> Result<Vec<JsonRow>, sqlx::Error> {
        match self {
            Self::MySql(conn) => {
                let rows = bind(sqlx::query::<MySql>(sql), params).fetch_all(conn).await?;
                rows::mysql::rows_to_json(&rows)
            }
            Self::Postgres(conn) => {
                let rows = bind(sqlx::query::<Postgres>(sql), params).fetch_all(conn).await?;
                rows::postgres::rows_to_json(&rows)
            }
            Self::Sqlite(conn) => {
                let rows = bind(sqlx::query::<sqlx::Any>(sql), params).fetch_all(conn).await?;
                rows::any::rows_to_json(&rows)
            }
        }
    }

    pub(crate) async fn close(self) -> Result<(), sqlx::Error> {
        match self {
            Self::MySql(conn) => conn.close().await,
            Self::Postgres(conn) => conn.close().await,
            Self::Sqlite(conn) => conn.close().await,
        }
    }
}

/// Pool sizing and wait bound shared by every backend.
fn options<DB: sqlx::Database>(config: &DatabaseConfig) -> PoolOptions<DB> {
    PoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.pool_acquire_timeout())
}

fn bind<'q, DB>(
    mut query: Query<'q, DB, DB::Arguments<'q>>,
    params: &[Param],
) -> Query<'q, DB, DB::Arguments<'q>>
where
    DB: sqlx::Database,
    i64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
{
    for param in params {
        query = match param {
            Param::Int(v) => query.bind(*v),
            Param::Text(s) => query.bind(s.clone()),
        };
    }
    query
}
