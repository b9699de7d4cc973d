//! Data models.
//!
//! This module re-exports the dynamic value types and the blog models.

pub mod blog;
pub mod record;
pub mod value;

// Re-export commonly used types
pub use blog::{Blog, Comment, User, next_id, now_timestamp, register_all};
pub use record::Record;
pub use value::Value;
