//! Column descriptors.

use crate::models::Value;
use std::sync::Arc;

/// Default applied by `save` when a column is unset.
#[derive(Clone)]
pub enum FieldDefault {
    /// A literal value.
    Value(Value),
    /// A generator invoked each time a default is needed.
    Generator(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    /// Produce the default value, invoking the generator if there is one.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Generator(generate) => generate(),
        }
    }
}

impl std::fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// Describes one table column.
///
/// Building a field only records its attributes. Whether a model has exactly
/// one primary key is checked when the model is registered.
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    column_type: String,
    primary_key: bool,
    default: Option<FieldDefault>,
}

impl Field {
    /// Create a field with an explicit column type tag.
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            name: None,
            column_type: column_type.into(),
            primary_key: false,
            default: None,
        }
    }

    /// `varchar(100)`; override with [`Field::ddl`].
    pub fn string() -> Self {
        Self::new("varchar(100)")
    }

    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    pub fn integer() -> Self {
        Self::new("bigint")
    }

    pub fn float() -> Self {
        Self::new("real")
    }

    pub fn text() -> Self {
        Self::new("text")
    }

    /// Use a column name other than the declared attribute name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn ddl(mut self, column_type: impl Into<String>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_with<F>(mut self, generate: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Generator(Arc::new(generate)));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "<{}: {}>",
            self.column_type,
            self.name.as_deref().unwrap_or("?")
        )
    }
}
