//! Database abstraction layer.
//!
//! This module provides database access functionality:
//! - Connection pool management and lifecycle
//! - Query execution
//! - Placeholder translation and parameter binding
//! - Type mappings
//! - Database dispatch macros for reducing code duplication

pub mod executor;
#[macro_use]
pub mod macros;
pub mod params;
pub mod pool;
pub mod types;

pub use executor::{Limit, QueryExecutor};
pub use macros::DatabaseType;
pub use pool::{ConnectionManager, DbPool, PoolState, PoolStatus, PooledConnection};
