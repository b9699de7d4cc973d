//! Row decoding.
//!
//! This module maps backend rows into [`Record`]s of [`Value`]s.
//!
//! # Architecture
//!
//! Type conversion uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Backend-specific decoders handle the actual value extraction
//!
//! MySQL reports reliable column types, so its decoder classifies the declared
//! type. SQLite is dynamically typed: its decoder classifies the runtime type
//! of each value, except for columns declared `boolean`.

use crate::db::DatabaseType;
use crate::models::{Record, Value};
use sqlx::mysql::{MySqlRow, MySqlTypeInfo, MySqlValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Decimal,
    Boolean,
    Text,
    Binary,
    Null,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    if lower == "null" {
        return TypeCategory::Null;
    }

    // Decimal/Numeric - check first as it overlaps with "numeric" in float checks
    if lower.contains("decimal") || lower.contains("numeric") {
        // SQLite's NUMERIC is actually a float
        if db == DatabaseType::SQLite && lower == "numeric" {
            return TypeCategory::Float;
        }
        return TypeCategory::Decimal;
    }

    // Boolean before integer: MySQL reports tinyint(1) as BOOLEAN
    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("int") || lower.contains("serial") || lower.contains("tiny") {
        return TypeCategory::Integer;
    }

    if lower.contains("float") || lower.contains("double") || lower == "real" {
        return TypeCategory::Float;
    }

    if lower.contains("blob") || lower.contains("binary") {
        return TypeCategory::Binary;
    }

    // Everything else (varchar, text, char, date, time, ...) is read as text
    TypeCategory::Text
}

// =============================================================================
// Decimal Type Support
// =============================================================================

/// Wrapper type for raw DECIMAL/NUMERIC values as strings.
/// This preserves the exact database representation.
#[derive(Debug)]
pub struct RawDecimal(pub String);

impl Type<sqlx::MySql> for RawDecimal {
    fn type_info() -> MySqlTypeInfo {
        <String as Type<sqlx::MySql>>::type_info()
    }

    fn compatible(ty: &MySqlTypeInfo) -> bool {
        let name = ty.name().to_lowercase();
        name.contains("decimal") || name.contains("numeric")
    }
}

impl<'r> Decode<'r, sqlx::MySql> for RawDecimal {
    fn decode(value: MySqlValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<sqlx::MySql>>::decode(value)?;
        Ok(RawDecimal(s.to_string()))
    }
}

// =============================================================================
// Row to Record Trait
// =============================================================================

/// Trait for converting backend rows to records.
pub trait RowToRecord {
    fn to_record(&self) -> Record;
}

impl RowToRecord for MySqlRow {
    fn to_record(&self) -> Record {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let category = categorize_type(col.type_info().name(), DatabaseType::MySql);
                (col.name().to_string(), mysql::decode_column(self, idx, category))
            })
            .collect()
    }
}

impl RowToRecord for SqliteRow {
    fn to_record(&self) -> Record {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                let declared = categorize_type(col.type_info().name(), DatabaseType::SQLite);
                (
                    col.name().to_string(),
                    sqlite::decode_column(self, idx, declared),
                )
            })
            .collect()
    }
}

// =============================================================================
// Backend-Specific Decoders
// =============================================================================

mod mysql {
    use super::*;

    pub fn decode_column(row: &MySqlRow, idx: usize, category: TypeCategory) -> Value {
        match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(column = idx, error = %e, "Failed to read column");
                return Value::Null;
            }
        }

        match category {
            TypeCategory::Decimal => decode_decimal(row, idx),
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => decode_boolean(row, idx),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => decode_binary(row, idx),
            TypeCategory::Null => Value::Null,
            TypeCategory::Text => decode_text(row, idx),
        }
    }

    fn decode_decimal(row: &MySqlRow, idx: usize) -> Value {
        match row.try_get::<RawDecimal, _>(idx) {
            Ok(v) => Value::Text(v.0),
            Err(e) => {
                tracing::error!("Failed to decode DECIMAL: {:?}", e);
                Value::Null
            }
        }
    }

    fn decode_integer(row: &MySqlRow, idx: usize) -> Value {
        // Try signed types
        if let Ok(v) = row.try_get::<i64, _>(idx) {
            return Value::Int(v);
        }
        if let Ok(v) = row.try_get::<i32, _>(idx) {
            return Value::Int(v.into());
        }
        if let Ok(v) = row.try_get::<i16, _>(idx) {
            return Value::Int(v.into());
        }
        if let Ok(v) = row.try_get::<i8, _>(idx) {
            return Value::Int(v.into());
        }
        // Try unsigned types
        if let Ok(v) = row.try_get::<u64, _>(idx) {
            return i64::try_from(v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::Text(v.to_string()));
        }
        if let Ok(v) = row.try_get::<u32, _>(idx) {
            return Value::Int(v.into());
        }
        if let Ok(v) = row.try_get::<u16, _>(idx) {
            return Value::Int(v.into());
        }
        if let Ok(v) = row.try_get::<u8, _>(idx) {
            return Value::Int(v.into());
        }
        Value::Null
    }

    fn decode_boolean(row: &MySqlRow, idx: usize) -> Value {
        row.try_get::<bool, _>(idx)
            .map(Value::Bool)
            .unwrap_or(Value::Null)
    }

    fn decode_float(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<f64, _>(idx) {
            return Value::Float(v);
        }
        if let Ok(v) = row.try_get::<f32, _>(idx) {
            return Value::Float(v.into());
        }
        Value::Null
    }

    fn decode_binary(row: &MySqlRow, idx: usize) -> Value {
        row.try_get::<Vec<u8>, _>(idx)
            .map(Value::Bytes)
            .unwrap_or(Value::Null)
    }

    fn decode_text(row: &MySqlRow, idx: usize) -> Value {
        if let Ok(v) = row.try_get::<String, _>(idx) {
            return Value::Text(v);
        }
        // Binary-collated strings come back as bytes
        match row.try_get::<Vec<u8>, _>(idx) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(s) => Value::Text(s),
                Err(e) => Value::Bytes(e.into_bytes()),
            },
            Err(_) => Value::Null,
        }
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, declared: TypeCategory) -> Value {
        let runtime = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => return Value::Null,
            Ok(raw) => categorize_type(raw.type_info().name(), DatabaseType::SQLite),
            Err(e) => {
                tracing::error!(column = idx, error = %e, "Failed to read column");
                return Value::Null;
            }
        };

        // Booleans are stored as integers; only the declaration tells them apart.
        let category = match (declared, runtime) {
            (TypeCategory::Boolean, TypeCategory::Integer) => TypeCategory::Boolean,
            (_, runtime) => runtime,
        };

        match category {
            TypeCategory::Integer => row
                .try_get::<i64, _>(idx)
                .map(Value::Int)
                .unwrap_or(Value::Null),
            TypeCategory::Boolean => row
                .try_get::<bool, _>(idx)
                .map(Value::Bool)
                .unwrap_or(Value::Null),
            TypeCategory::Float | TypeCategory::Decimal => row
                .try_get::<f64, _>(idx)
                .map(Value::Float)
                .unwrap_or(Value::Null),
            TypeCategory::Binary => row
                .try_get::<Vec<u8>, _>(idx)
                .map(Value::Bytes)
                .unwrap_or(Value::Null),
            TypeCategory::Null => Value::Null,
            TypeCategory::Text => row
                .try_get::<String, _>(idx)
                .map(Value::Text)
                .unwrap_or(Value::Null),
        }
    }
}
