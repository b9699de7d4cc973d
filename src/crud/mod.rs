//! CRUD facade.
//!
//! A [`Table`] binds a registered [`Model`](crate::schema::Model) type to a
//! [`QueryExecutor`](crate::db::QueryExecutor) and exposes
//! `find_all`, `find`, `count`, `save`, `update` and `remove`.

mod options;
mod table;

pub use options::FindOptions;
pub use table::Table;

use serde::{Deserialize, Serialize};

/// How writes treat an affected-row count other than 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowCountPolicy {
    /// Log a warning and return normally.
    #[default]
    Lenient,
    /// Fail with [`OrmError::RowCount`](crate::error::OrmError::RowCount).
    Strict,
}
