//! Query execution engine.
//!
//! This module provides the two execution entry points used by the CRUD layer:
//! - [`QueryExecutor::read`]: SELECT with an optional limit, fetched eagerly
//! - [`QueryExecutor::write`]: INSERT/UPDATE/DELETE, optionally inside an
//!   explicit transaction
//!
//! # Architecture
//!
//! The executor uses database-specific implementations organized in submodules:
//! - `mysql`: MySQL-specific read and write operations
//! - `sqlite`: SQLite-specific read and write operations
//!
//! Statements arrive with portable `?` placeholders. Each entry point acquires
//! one pooled connection, translates the placeholders exactly once, binds the
//! arguments and releases the connection when it returns.

use crate::crud::Table;
use crate::db::params::translate_placeholders;
use crate::db::pool::{self, ConnectionManager};
use crate::error::{OrmError, OrmResult};
use crate::models::{Record, Value};
use crate::schema::{self, Model};
use tracing::{debug, info, warn};

/// Row limit appended to a SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    /// `limit ?`
    Count(u64),
    /// `limit ?, ?`
    Range { offset: u64, count: u64 },
}

impl Limit {
    /// SQL suffix for this limit.
    pub fn clause(&self) -> &'static str {
        match self {
            Limit::Count(_) => " limit ?",
            Limit::Range { .. } => " limit ?, ?",
        }
    }

    /// Arguments bound to the placeholders of [`Limit::clause`].
    pub fn args(&self) -> OrmResult<Vec<Value>> {
        match *self {
            Limit::Count(count) => Ok(vec![limit_value(count)?]),
            Limit::Range { offset, count } => Ok(vec![limit_value(offset)?, limit_value(count)?]),
        }
    }
}

fn limit_value(n: u64) -> OrmResult<Value> {
    i64::try_from(n)
        .map(Value::Int)
        .map_err(|_| OrmError::invalid_input(format!("Limit value {} is too large", n)))
}

impl From<u64> for Limit {
    fn from(count: u64) -> Self {
        Limit::Count(count)
    }
}

impl From<(u64, u64)> for Limit {
    fn from((offset, count): (u64, u64)) -> Self {
        Limit::Range { offset, count }
    }
}

impl TryFrom<&[i64]> for Limit {
    type Error = OrmError;

    fn try_from(values: &[i64]) -> Result<Self, Self::Error> {
        let unsigned = |v: i64| {
            u64::try_from(v)
                .map_err(|_| OrmError::invalid_input(format!("Invalid limit value: {}", v)))
        };
        match values {
            [count] => Ok(Limit::Count(unsigned(*count)?)),
            [offset, count] => Ok(Limit::Range {
                offset: unsigned(*offset)?,
                count: unsigned(*count)?,
            }),
            other => Err(OrmError::invalid_input(format!(
                "Invalid limit: expected 1 or 2 values, got {}",
                other.len()
            ))),
        }
    }
}

/// Query executor bound to one connection manager.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    manager: ConnectionManager,
}

impl QueryExecutor {
    pub fn new(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Executor over the process-wide pool.
    pub fn global() -> Self {
        Self::new(pool::global().clone())
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Commit mode the pool was initialized with.
    pub async fn default_autocommit(&self) -> OrmResult<bool> {
        self.manager.autocommit().await
    }

    /// CRUD facade for a registered model type.
    pub fn table<M: Model>(&self) -> OrmResult<Table<'_, M>> {
        Ok(Table::new(self, schema::metadata::<M>()?))
    }

    /// Execute a SELECT and return every row.
    pub async fn read(
        &self,
        sql: &str,
        args: &[Value],
        limit: Option<Limit>,
    ) -> OrmResult<Vec<Record>> {
        let mut sql = sql.to_string();
        let mut args = args.to_vec();
        if let Some(limit) = limit {
            sql.push_str(limit.clause());
            args.extend(limit.args()?);
        }

        info!(sql = %sql, args = ?args, "SQL");

        let mut conn = self.manager.acquire().await?;
        let translated = translate_placeholders(&sql, conn.db_type());
        check_arity(translated.placeholders, args.len())?;

        let records = crate::impl_db_dispatch!(PooledConnection, &mut conn, {
            MySql(c) => mysql::fetch_all(c, &translated.sql, &args).await?,
            SQLite(c) => sqlite::fetch_all(c, &translated.sql, &args).await?,
        });

        debug!(rows = records.len(), "rows returned");
        Ok(records)
    }

    /// Execute an INSERT, UPDATE or DELETE and return the affected row count.
    ///
    /// With `autocommit == false` the statement runs in its own transaction;
    /// on failure the transaction is rolled back and the statement's error is
    /// returned.
    pub async fn write(&self, sql: &str, args: &[Value], autocommit: bool) -> OrmResult<u64> {
        info!(sql = %sql, args = ?args, autocommit, "SQL");

        let mut conn = self.manager.acquire().await?;
        let translated = translate_placeholders(sql, conn.db_type());
        check_arity(translated.placeholders, args.len())?;

        let affected = crate::impl_db_dispatch!(PooledConnection, &mut conn, {
            MySql(c) => mysql::execute_write(c, &translated.sql, args, autocommit).await?,
            SQLite(c) => sqlite::execute_write(c, &translated.sql, args, autocommit).await?,
        });

        debug!(affected, "rows affected");
        Ok(affected)
    }
}

fn check_arity(placeholders: usize, args: usize) -> OrmResult<()> {
    if placeholders != args {
        return Err(OrmError::invalid_input(format!(
            "Statement has {} placeholder(s) but {} argument(s) were given",
            placeholders, args
        )));
    }
    Ok(())
}

fn log_rollback_failure(error: &sqlx::Error) {
    warn!(error = %error, "Rollback failed");
}

// =============================================================================
// Database-Specific Implementations
// =============================================================================
//
// Each module below provides the same interface adapted to its database type.

mod mysql {
    use super::*;
    use crate::db::params::bind_mysql_param;
    use crate::db::types::RowToRecord;
    use futures_util::TryStreamExt;
    use sqlx::pool::PoolConnection;
    use sqlx::{Connection, MySql};

    pub async fn fetch_all(
        conn: &mut PoolConnection<MySql>,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Vec<Record>> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }

        let mut records = Vec::new();
        let mut rows = query.fetch(&mut **conn);
        while let Some(row) = rows.try_next().await? {
            records.push(row.to_record());
        }
        Ok(records)
    }

    pub async fn execute_write(
        conn: &mut PoolConnection<MySql>,
        sql: &str,
        args: &[Value],
        autocommit: bool,
    ) -> OrmResult<u64> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_mysql_param(query, arg);
        }

        if autocommit {
            return Ok(query.execute(&mut **conn).await?.rows_affected());
        }

        let mut tx = conn.begin().await?;
        match query.execute(&mut *tx).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    log_rollback_failure(&rollback);
                }
                Err(e.into())
            }
        }
    }
}

mod sqlite {
    use super::*;
    use crate::db::params::bind_sqlite_param;
    use crate::db::types::RowToRecord;
    use futures_util::TryStreamExt;
    use sqlx::pool::PoolConnection;
    use sqlx::{Connection, Sqlite};

    pub async fn fetch_all(
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
        args: &[Value],
    ) -> OrmResult<Vec<Record>> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }

        let mut records = Vec::new();
        let mut rows = query.fetch(&mut **conn);
        while let Some(row) = rows.try_next().await? {
            records.push(row.to_record());
        }
        Ok(records)
    }

    pub async fn execute_write(
        conn: &mut PoolConnection<Sqlite>,
        sql: &str,
        args: &[Value],
        autocommit: bool,
    ) -> OrmResult<u64> {
        let mut query = sqlx::query(sql);
        for arg in args {
            query = bind_sqlite_param(query, arg);
        }

        if autocommit {
            return Ok(query.execute(&mut **conn).await?.rows_affected());
        }

        let mut tx = conn.begin().await?;
        match query.execute(&mut *tx).await {
            Ok(result) => {
                tx.commit().await?;
                Ok(result.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    log_rollback_failure(&rollback);
                }
                Err(e.into())
            }
        }
    }
}
