//! Model declarations.

use crate::models::{Record, Value};
use crate::schema::Field;

/// The declared shape of a model type: its table and fields in source order.
#[derive(Debug, Clone)]
pub struct Declaration {
    table: String,
    fields: Vec<(String, Field)>,
}

impl Declaration {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field bound to an attribute name. Order of calls is column order.
    pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
        self.fields.push((attribute.into(), field));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn fields(&self) -> &[(String, Field)] {
        &self.fields
    }

    pub(crate) fn into_parts(self) -> (String, Vec<(String, Field)>) {
        (self.table, self.fields)
    }
}

/// A type mapped onto one table.
///
/// Instances are record-backed: values are keyed by column name and are only
/// persisted through the CRUD facade.
pub trait Model: Sized + Send + Sync + 'static {
    /// Declare the table and its fields. Called once, at registration.
    fn declare() -> Declaration;

    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn get(&self, column: &str) -> Option<&Value> {
        self.record().get(column)
    }

    fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.record_mut().set(column, value);
        self
    }
}

/// Define a record-backed model struct and its [`Model`] implementation.
///
/// # Example
///
/// ```ignore
/// model! {
///     /// A tag attached to blogs.
///     pub struct Tag in "tags" {
///         id: Field::integer().primary_key(),
///         label: Field::string().ddl("varchar(30)"),
///     }
/// }
/// ```
#[macro_export]
macro_rules! model {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident in $table:literal {
            $($attr:ident : $field:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            record: $crate::models::Record,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            /// Builder form of `Model::set`.
            pub fn with(
                mut self,
                column: impl Into<String>,
                value: impl Into<$crate::models::Value>,
            ) -> Self {
                self.record.set(column, value);
                self
            }
        }

        impl $crate::schema::Model for $name {
            fn declare() -> $crate::schema::Declaration {
                $crate::schema::Declaration::new($table)
                    $(.field(stringify!($attr), $field))+
            }

            fn from_record(record: $crate::models::Record) -> Self {
                Self { record }
            }

            fn record(&self) -> &$crate::models::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::models::Record {
                &mut self.record
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    model! {
        struct Note in "notes" {
            id: Field::integer().primary_key(),
            body: Field::text(),
        }
    }

    #[test]
    fn test_macro_declares_fields_in_order() {
        let decl = Note::declare();
        assert_eq!(decl.table(), "notes");
        let names: Vec<_> = decl.fields().iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(names, vec!["id", "body"]);
        assert!(decl.fields()[0].1.is_primary_key());
    }

    #[test]
    fn test_get_and_set() {
        let mut note = Note::new().with("body", "hello");
        note.set("id", 3);
        assert_eq!(note.get("id"), Some(&Value::Int(3)));
        assert_eq!(note.record().get_str("body"), Some("hello"));
    }
}
