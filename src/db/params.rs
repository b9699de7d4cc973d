//! Parameter binding and placeholder translation.
//!
//! Statements are built with the portable `?` placeholder. Right before
//! execution the executor runs [`translate_placeholders`] once, producing the
//! backend's native markers, then binds each [`Value`] with the matching
//! `bind_*_param` function.

use crate::db::DatabaseType;
use crate::models::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};

/// The portable placeholder token emitted by the statement builders.
pub const PLACEHOLDER: char = '?';

/// A statement rewritten for a specific backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedSql {
    pub sql: String,
    /// Number of placeholders found (and rewritten).
    pub placeholders: usize,
}

/// Rewrite portable placeholders into the backend's native markers.
///
/// A single pass over the text. Placeholders inside quoted strings or quoted
/// identifiers are left alone.
///
/// - MySQL keeps `?`
/// - SQLite gets numbered `?1`, `?2`, ...
pub fn translate_placeholders(sql: &str, db_type: DatabaseType) -> TranslatedSql {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut placeholders = 0;
    let mut quote: Option<char> = None;
    let mut chars = sql.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                } else if c == '\\' && q != '`' && db_type == DatabaseType::MySql {
                    // MySQL string literals allow backslash escapes
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
            }
            None if c == '\'' || c == '"' || c == '`' => {
                quote = Some(c);
                out.push(c);
            }
            None if c == PLACEHOLDER => {
                placeholders += 1;
                match db_type {
                    DatabaseType::MySql => out.push('?'),
                    DatabaseType::SQLite => {
                        out.push('?');
                        out.push_str(&placeholders.to_string());
                    }
                }
            }
            None => out.push(c),
        }
    }

    TranslatedSql {
        sql: out,
        placeholders,
    }
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(
    query: sqlx::query::Query<'q, MySql, MySqlArguments>,
    param: &'q Value,
) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    param: &'q Value,
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_keeps_question_marks() {
        let t = translate_placeholders(
            "update `users` set `name`=?, `email`=? where `id`=?",
            DatabaseType::MySql,
        );
        assert_eq!(t.sql, "update `users` set `name`=?, `email`=? where `id`=?");
        assert_eq!(t.placeholders, 3);
    }

    #[test]
    fn test_sqlite_numbers_placeholders() {
        let t = translate_placeholders(
            "insert into `users` (`name`, `id`) values (?, ?)",
            DatabaseType::SQLite,
        );
        assert_eq!(t.sql, "insert into `users` (`name`, `id`) values (?1, ?2)");
        assert_eq!(t.placeholders, 2);
    }

    #[test]
    fn test_quoted_question_marks_are_not_placeholders() {
        let t = translate_placeholders(
            "select `a?` from t where b = 'why?' and c = ?",
            DatabaseType::SQLite,
        );
        assert_eq!(t.sql, "select `a?` from t where b = 'why?' and c = ?1");
        assert_eq!(t.placeholders, 1);
    }

    #[test]
    fn test_mysql_backslash_escape_in_literal() {
        let t = translate_placeholders(r"select 'it\'s?' , ?", DatabaseType::MySql);
        assert_eq!(t.placeholders, 1);
    }

    #[test]
    fn test_no_placeholders() {
        let t = translate_placeholders("select 1", DatabaseType::SQLite);
        assert_eq!(t.sql, "select 1");
        assert_eq!(t.placeholders, 0);
    }

    #[test]
    fn test_translation_is_single_pass() {
        // A marker produced by the rewrite must not be rewritten again.
        let once = translate_placeholders("? ?", DatabaseType::SQLite);
        assert_eq!(once.sql, "?1 ?2");
        let count = once.sql.matches('?').count();
        assert_eq!(count, once.placeholders);
    }
}
