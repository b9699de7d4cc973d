//! Schema registrar.
//!
//! Turns a model's [`Declaration`] into immutable [`TableMetadata`]: the
//! primary key, the ordered non-key columns and the four precomputed statement
//! templates. Metadata is built once per type and shared read-only afterwards.
//!
//! Templates use the portable `?` placeholder; the executor rewrites it to the
//! driver's marker right before execution.

use crate::db::params::PLACEHOLDER;
use crate::error::{OrmError, OrmResult};
use crate::schema::{Declaration, Field, Model};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::{debug, info};

/// A declared field with its resolved column name.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    attribute: String,
    field: Field,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attribute the field was declared under.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn quoted(&self) -> String {
        quote_identifier(&self.name)
    }
}

/// Precomputed schema and SQL templates for one model type.
#[derive(Debug)]
pub struct TableMetadata {
    model: &'static str,
    table: String,
    primary_key: Column,
    fields: Vec<Column>,
    select_sql: String,
    insert_sql: String,
    /// None for models whose only column is the primary key.
    update_sql: Option<String>,
    delete_sql: String,
}

impl TableMetadata {
    /// Build metadata from a declaration.
    ///
    /// Fails with a configuration error unless exactly one field is marked as
    /// the primary key, and on duplicate column names or an empty table name.
    pub fn build(model: &'static str, declaration: Declaration) -> OrmResult<Self> {
        let (table, declared) = declaration.into_parts();
        if table.trim().is_empty() {
            return Err(OrmError::configuration(format!(
                "Model {} declares an empty table name",
                model
            )));
        }

        let mut seen = HashSet::new();
        let mut primary_key: Option<Column> = None;
        let mut fields = Vec::with_capacity(declared.len());

        for (attribute, field) in declared {
            let name = field.name().unwrap_or(attribute.as_str()).to_string();
            if !seen.insert(name.clone()) {
                return Err(OrmError::configuration(format!(
                    "Duplicate column '{}' in model {}",
                    name, model
                )));
            }
            debug!(model, column = %name, field = %field, "Found mapping");

            let column = Column {
                name,
                attribute,
                field,
            };
            if column.field.is_primary_key() {
                if let Some(existing) = &primary_key {
                    return Err(OrmError::configuration(format!(
                        "Duplicate primary key for model {}: '{}' and '{}'",
                        model, existing.name, column.name
                    )));
                }
                primary_key = Some(column);
            } else {
                fields.push(column);
            }
        }

        let primary_key = primary_key.ok_or_else(|| {
            OrmError::configuration(format!("Primary key not found for model {}", model))
        })?;

        let quoted_table = quote_identifier(&table);
        let quoted_pk = primary_key.quoted();
        let quoted_fields: Vec<String> = fields.iter().map(Column::quoted).collect();

        let select_sql = std::iter::once(quoted_pk.clone())
            .chain(quoted_fields.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ");
        let select_sql = format!("select {} from {}", select_sql, quoted_table);

        let insert_columns = quoted_fields
            .iter()
            .cloned()
            .chain(std::iter::once(quoted_pk.clone()))
            .collect::<Vec<_>>()
            .join(", ");
        let insert_sql = format!(
            "insert into {} ({}) values ({})",
            quoted_table,
            insert_columns,
            placeholders(fields.len() + 1)
        );

        let update_sql = (!fields.is_empty()).then(|| {
            let assignments = quoted_fields
                .iter()
                .map(|f| format!("{}={}", f, PLACEHOLDER))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "update {} set {} where {}={}",
                quoted_table, assignments, quoted_pk, PLACEHOLDER
            )
        });

        let delete_sql = format!(
            "delete from {} where {}={}",
            quoted_table, quoted_pk, PLACEHOLDER
        );

        Ok(Self {
            model,
            table,
            primary_key,
            fields,
            select_sql,
            insert_sql,
            update_sql,
            delete_sql,
        })
    }

    /// Rust type name of the model.
    pub fn model(&self) -> &'static str {
        self.model
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn quoted_table(&self) -> String {
        quote_identifier(&self.table)
    }

    pub fn primary_key(&self) -> &Column {
        &self.primary_key
    }

    /// Non-key columns in declaration order.
    pub fn fields(&self) -> &[Column] {
        &self.fields
    }

    /// Columns in INSERT binding order: non-key fields, then the primary key.
    pub fn insert_columns(&self) -> impl Iterator<Item = &Column> {
        self.fields.iter().chain(std::iter::once(&self.primary_key))
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> Option<&str> {
        self.update_sql.as_deref()
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }
}

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn placeholders(count: usize) -> String {
    vec![PLACEHOLDER.to_string(); count].join(", ")
}

static REGISTRY: LazyLock<RwLock<HashMap<TypeId, Arc<TableMetadata>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register a model type, building its metadata.
///
/// Registering the same type again returns the metadata built the first time.
pub fn register<M: Model>() -> OrmResult<Arc<TableMetadata>> {
    let type_id = TypeId::of::<M>();
    if let Some(existing) = lookup(type_id) {
        return Ok(existing);
    }

    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    // Another caller may have registered it between the read and write lock.
    if let Some(existing) = registry.get(&type_id) {
        return Ok(Arc::clone(existing));
    }

    let model = std::any::type_name::<M>();
    let metadata = Arc::new(TableMetadata::build(model, M::declare())?);
    info!(
        model,
        table = %metadata.table(),
        primary_key = %metadata.primary_key().name(),
        fields = metadata.fields().len(),
        "Registered model"
    );
    registry.insert(type_id, Arc::clone(&metadata));
    Ok(metadata)
}

/// Look up the metadata of a registered model type.
pub fn metadata<M: Model>() -> OrmResult<Arc<TableMetadata>> {
    lookup(TypeId::of::<M>()).ok_or_else(|| {
        OrmError::configuration(format!(
            "Model {} is not registered; call register() at startup",
            std::any::type_name::<M>()
        ))
    })
}

pub fn is_registered<M: Model>() -> bool {
    lookup(TypeId::of::<M>()).is_some()
}

fn lookup(type_id: TypeId) -> Option<Arc<TableMetadata>> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned()
}
