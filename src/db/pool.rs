//! Connection pool management.
//!
//! This module owns the process-wide connection pool and its lifecycle:
//! `Uninitialized -> Ready -> Closed`. Nothing can be acquired outside `Ready`.
//!
//! Callers borrow one [`PooledConnection`] per logical operation. The borrow is
//! returned to the pool when it is dropped, on every exit path. When all
//! connections are checked out, [`ConnectionManager::acquire`] waits for one to
//! be released.

use crate::config::{Endpoint, PoolConfig};
use crate::db::DatabaseType;
use crate::error::{OrmError, OrmResult};
use sqlx::pool::PoolConnection;
use sqlx::{
    Connection, MySql, MySqlConnection, MySqlPool, Sqlite, SqliteConnection, SqlitePool,
    mysql::MySqlConnectOptions, mysql::MySqlPoolOptions, sqlite::SqliteConnectOptions,
    sqlite::SqlitePoolOptions,
};
use std::str::FromStr;
use std::sync::{Arc, LazyLock};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Acquire wait used when the caller configured no timeout. Only bounds
/// waiting for a checked-out connection; the initial connect is bounded by
/// [`PoolConfig::connect_timeout`].
const UNBOUNDED_ACQUIRE_WAIT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Backend-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Close the connection pool, waiting for checked-out connections.
    pub async fn close(&self) {
        crate::impl_db_dispatch!(DbPool, self, {
            MySql(pool) => pool.close().await,
            SQLite(pool) => pool.close().await,
        })
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        match self {
            DbPool::MySql(_) => DatabaseType::MySql,
            DbPool::SQLite(_) => DatabaseType::SQLite,
        }
    }

    /// Check out one connection, waiting while the pool is exhausted.
    pub async fn acquire(&self) -> OrmResult<PooledConnection> {
        let conn = crate::impl_db_dispatch!(DbPool, self, {
            MySql(pool) => PooledConnection::MySql(pool.acquire().await?),
            SQLite(pool) => PooledConnection::SQLite(pool.acquire().await?),
        });
        Ok(conn)
    }

    fn status(&self) -> PoolStatus {
        crate::impl_db_dispatch!(DbPool, self, {
            MySql(pool) => PoolStatus { size: pool.size(), idle: pool.num_idle() },
            SQLite(pool) => PoolStatus { size: pool.size(), idle: pool.num_idle() },
        })
    }
}

/// A connection checked out of the pool. Dropping it returns it.
#[derive(Debug)]
pub enum PooledConnection {
    MySql(PoolConnection<MySql>),
    SQLite(PoolConnection<Sqlite>),
}

impl PooledConnection {
    pub fn db_type(&self) -> DatabaseType {
        match self {
            PooledConnection::MySql(_) => DatabaseType::MySql,
            PooledConnection::SQLite(_) => DatabaseType::SQLite,
        }
    }
}

/// Lifecycle state of a [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Uninitialized,
    Ready,
    Closed,
}

impl std::fmt::Display for PoolState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatus {
    /// Open connections, idle or checked out.
    pub size: u32,
    pub idle: usize,
}

#[derive(Debug)]
enum Lifecycle {
    Uninitialized,
    Ready { pool: DbPool, config: PoolConfig },
    Closed,
}

impl Lifecycle {
    fn state(&self) -> PoolState {
        match self {
            Lifecycle::Uninitialized => PoolState::Uninitialized,
            Lifecycle::Ready { .. } => PoolState::Ready,
            Lifecycle::Closed => PoolState::Closed,
        }
    }

    fn not_ready_error(&self) -> OrmError {
        match self {
            Lifecycle::Uninitialized => {
                OrmError::configuration("Connection pool is not initialized; call init() first")
            }
            Lifecycle::Closed => OrmError::configuration("Connection pool has been shut down"),
            Lifecycle::Ready { .. } => OrmError::internal("Connection pool is ready"),
        }
    }
}

/// Owner of one connection pool and its lifecycle.
///
/// Cloning is cheap and every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    lifecycle: Arc<RwLock<Lifecycle>>,
}

impl ConnectionManager {
    /// Create a new, uninitialized connection manager.
    pub fn new() -> Self {
        Self {
            lifecycle: Arc::new(RwLock::new(Lifecycle::Uninitialized)),
        }
    }

    /// Establish the pool. Allowed exactly once per manager.
    pub async fn init(&self, config: PoolConfig) -> OrmResult<()> {
        // Held across the connect so concurrent init calls cannot both succeed.
        let mut lifecycle = self.lifecycle.write().await;
        match &*lifecycle {
            Lifecycle::Uninitialized => {}
            Lifecycle::Ready { .. } => {
                return Err(OrmError::configuration(
                    "Connection pool is already initialized",
                ));
            }
            Lifecycle::Closed => {
                return Err(OrmError::configuration(
                    "Connection pool has been shut down and cannot be re-initialized",
                ));
            }
        }

        config.validate()?;
        info!(
            db_type = %config.db_type(),
            target = %config.display_target(),
            min_size = config.min_size,
            max_size = config.max_size,
            autocommit = config.autocommit,
            "Creating connection pool"
        );

        let pool = create_pool(&config).await?;
        *lifecycle = Lifecycle::Ready { pool, config };
        info!("Connection pool ready");
        Ok(())
    }

    /// Drain and close all connections. Later operations fail with a
    /// configuration error. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let previous = {
            let mut lifecycle = self.lifecycle.write().await;
            std::mem::replace(&mut *lifecycle, Lifecycle::Closed)
        }; // Lock released here

        match previous {
            Lifecycle::Ready { pool, .. } => {
                info!("Closing connection pool");
                pool.close().await;
                info!("Connection pool closed");
            }
            Lifecycle::Uninitialized => debug!("Shutdown before init; pool marked closed"),
            Lifecycle::Closed => debug!("Connection pool already closed"),
        }
    }

    pub async fn state(&self) -> PoolState {
        self.lifecycle.read().await.state()
    }

    /// Check out one connection for a single logical operation.
    pub async fn acquire(&self) -> OrmResult<PooledConnection> {
        let pool = self.pool().await?;
        let conn = pool.acquire().await?;
        debug!(db_type = %conn.db_type(), "Connection acquired");
        Ok(conn)
    }

    /// Get a handle to the live pool.
    pub async fn pool(&self) -> OrmResult<DbPool> {
        let lifecycle = self.lifecycle.read().await;
        match &*lifecycle {
            Lifecycle::Ready { pool, .. } => Ok(pool.clone()),
            other => Err(other.not_ready_error()),
        }
    }

    /// Commit mode configured at init.
    pub async fn autocommit(&self) -> OrmResult<bool> {
        let lifecycle = self.lifecycle.read().await;
        match &*lifecycle {
            Lifecycle::Ready { config, .. } => Ok(config.autocommit),
            other => Err(other.not_ready_error()),
        }
    }

    /// Current occupancy, if the pool is ready.
    pub async fn status(&self) -> Option<PoolStatus> {
        let lifecycle = self.lifecycle.read().await;
        match &*lifecycle {
            Lifecycle::Ready { pool, .. } => Some(pool.status()),
            _ => None,
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: LazyLock<ConnectionManager> = LazyLock::new(ConnectionManager::new);

/// The process-wide connection manager.
pub fn global() -> &'static ConnectionManager {
    &GLOBAL
}

/// Initialize the process-wide pool.
pub async fn init(config: PoolConfig) -> OrmResult<()> {
    global().init(config).await
}

/// Shut down the process-wide pool.
pub async fn shutdown() {
    global().shutdown().await
}

/// Create a connection pool for the given configuration.
///
/// One connection is opened and closed up front so that an unreachable server
/// fails `init` within the connect timeout. The pool itself opens connections
/// on demand.
async fn create_pool(config: &PoolConfig) -> OrmResult<DbPool> {
    let acquire_timeout = config.acquire_timeout().unwrap_or(UNBOUNDED_ACQUIRE_WAIT);

    match &config.endpoint {
        Endpoint::Mysql {
            host,
            port,
            user,
            password,
            database,
            charset,
        } => {
            let options = MySqlConnectOptions::new()
                .host(host)
                .port(*port)
                .username(user)
                .password(password)
                .database(database)
                .charset(charset);

            verify_connection::<MySqlConnection>(
                &options,
                DatabaseType::MySql,
                config.connect_timeout(),
            )
            .await?;

            let pool = MySqlPoolOptions::new()
                .min_connections(config.min_size)
                .max_connections(config.max_size)
                .acquire_timeout(acquire_timeout)
                .connect_lazy_with(options);
            Ok(DbPool::MySql(pool))
        }
        Endpoint::Sqlite { filename } => {
            let options = if filename == ":memory:" {
                SqliteConnectOptions::from_str("sqlite::memory:")?
            } else {
                SqliteConnectOptions::new()
                    .filename(filename)
                    .create_if_missing(true)
            };

            verify_connection::<SqliteConnection>(
                &options,
                DatabaseType::SQLite,
                config.connect_timeout(),
            )
            .await?;

            let pool = SqlitePoolOptions::new()
                .min_connections(config.min_size)
                .max_connections(config.max_size)
                .acquire_timeout(acquire_timeout)
                .connect_lazy_with(options);
            Ok(DbPool::SQLite(pool))
        }
    }
}

/// Open one connection within `limit` and close it again.
async fn verify_connection<C: Connection>(
    options: &C::Options,
    db_type: DatabaseType,
    limit: Duration,
) -> OrmResult<()> {
    let conn = match tokio::time::timeout(limit, C::connect_with(options)).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            return Err(OrmError::connection(
                format!("Failed to connect: {}", e),
                connection_suggestion(db_type, &e),
            ));
        }
        Err(_) => {
            return Err(OrmError::connection(
                format!(
                    "Timed out after {}s connecting to the {} server",
                    limit.as_secs(),
                    db_type
                ),
                format!("Check that the {} server is reachable", db_type),
            ));
        }
    };

    if let Err(e) = conn.close().await {
        debug!(error = %e, "Failed to close verification connection");
    }
    Ok(())
}

/// Generate a helpful suggestion for connection errors.
fn connection_suggestion(db_type: DatabaseType, error: &sqlx::Error) -> String {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") {
        return format!(
            "Check that the {} server is running and accessible",
            db_type
        );
    }

    if error_str.contains("access denied") || error_str.contains("password") {
        return "Verify the user and password".to_string();
    }

    if error_str.contains("unknown database") {
        return "Check that the database exists".to_string();
    }

    match db_type {
        DatabaseType::MySql => "Verify host, port and database name".to_string(),
        DatabaseType::SQLite => "Verify the file path exists and is writable".to_string(),
    }
}
