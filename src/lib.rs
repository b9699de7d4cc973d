//! Blog ORM Library
//!
//! A small object-relational mapping layer for the blog application, over a
//! pooled MySQL or SQLite connection.
//!
//! Typical use:
//! 1. Declare models with [`model!`] and register them with
//!    [`schema::register`] (or [`models::register_all`] for the blog models).
//! 2. Initialize the pool with [`db::pool::init`].
//! 3. Use [`QueryExecutor::table`] for `find_all`, `find`, `count`, `save`,
//!    `update` and `remove`.
//! 4. Call [`db::pool::shutdown`] before exit.

pub mod config;
pub mod crud;
pub mod db;
pub mod error;
pub mod models;
pub mod schema;

pub use config::{Config, PoolConfig};
pub use crud::{FindOptions, RowCountPolicy, Table};
pub use db::{Limit, QueryExecutor};
pub use error::{OrmError, OrmResult};
pub use models::{Record, Value};
pub use schema::{Field, Model};
