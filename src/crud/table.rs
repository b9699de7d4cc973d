use crate::crud::{FindOptions, RowCountPolicy};
use crate::db::{Limit, QueryExecutor};
use crate::error::{OrmError, OrmResult};
use crate::models::Value;
use crate::schema::{Model, TableMetadata};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// CRUD operations for one model type.
pub struct Table<'a, M: Model> {
    executor: &'a QueryExecutor,
    meta: Arc<TableMetadata>,
    policy: RowCountPolicy,
    _model: PhantomData<fn() -> M>,
}

impl<'a, M: Model> Table<'a, M> {
    pub(crate) fn new(executor: &'a QueryExecutor, meta: Arc<TableMetadata>) -> Self {
        Self {
            executor,
            meta,
            policy: RowCountPolicy::default(),
            _model: PhantomData,
        }
    }

    pub fn with_policy(mut self, policy: RowCountPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.meta
    }

    /// Rows matching `options`, in result order. Empty when nothing matches.
    pub async fn find_all(&self, options: FindOptions) -> OrmResult<Vec<M>> {
        let mut sql = self.meta.select_sql().to_string();
        options.apply(&mut sql);
        let records = self
            .executor
            .read(&sql, &options.args, options.limit)
            .await?;
        Ok(records.into_iter().map(M::from_record).collect())
    }

    /// Row with the given primary key, or `None`.
    pub async fn find(&self, primary_key: impl Into<Value>) -> OrmResult<Option<M>> {
        let sql = format!(
            "{} where {}=?",
            self.meta.select_sql(),
            self.meta.primary_key().quoted()
        );
        let records = self
            .executor
            .read(&sql, &[primary_key.into()], Some(Limit::Count(1)))
            .await?;
        Ok(records.into_iter().next().map(M::from_record))
    }

    /// Evaluate `select <expression> as n` over the table.
    ///
    /// Returns `None` when the query yields no row, which is distinct from a
    /// count of zero.
    pub async fn count(
        &self,
        expression: &str,
        filter: Option<&str>,
        args: &[Value],
    ) -> OrmResult<Option<Value>> {
        let mut sql = format!(
            "select {} as n from {}",
            expression,
            self.meta.quoted_table()
        );
        if let Some(filter) = filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        let records = self.executor.read(&sql, args, Some(Limit::Count(1))).await?;
        Ok(records
            .into_iter()
            .next()
            .and_then(|mut record| record.remove("n")))
    }

    /// Insert the instance. Unset columns take their field default, which is
    /// written back onto the instance.
    pub async fn save(&self, model: &mut M) -> OrmResult<u64> {
        let record = model.record_mut();
        let mut args = Vec::with_capacity(self.meta.fields().len() + 1);
        for column in self.meta.insert_columns() {
            if record.is_unset(column.name()) {
                if let Some(default) = column.field().default() {
                    let value = default.resolve();
                    debug!(column = %column.name(), value = ?value, "Using default value");
                    record.set(column.name(), value);
                }
            }
            args.push(record.get(column.name()).cloned().unwrap_or_default());
        }

        let autocommit = self.executor.default_autocommit().await?;
        let affected = self
            .executor
            .write(self.meta.insert_sql(), &args, autocommit)
            .await?;
        self.check_row_count("insert", affected)
    }

    /// Write the instance's non-key columns to the row with its primary key.
    pub async fn update(&self, model: &M) -> OrmResult<u64> {
        let sql = self.meta.update_sql().ok_or_else(|| {
            OrmError::invalid_input(format!(
                "Model {} has no non-key fields to update",
                self.meta.model()
            ))
        })?;
        let args: Vec<Value> = self
            .meta
            .fields()
            .iter()
            .chain(std::iter::once(self.meta.primary_key()))
            .map(|column| model.get(column.name()).cloned().unwrap_or_default())
            .collect();

        let autocommit = self.executor.default_autocommit().await?;
        let affected = self.executor.write(sql, &args, autocommit).await?;
        self.check_row_count("update", affected)
    }

    /// Delete the row with the instance's primary key.
    pub async fn remove(&self, model: &M) -> OrmResult<u64> {
        let pk = model
            .get(self.meta.primary_key().name())
            .cloned()
            .unwrap_or_default();

        let autocommit = self.executor.default_autocommit().await?;
        let affected = self
            .executor
            .write(self.meta.delete_sql(), &[pk], autocommit)
            .await?;
        self.check_row_count("remove", affected)
    }

    fn check_row_count(&self, operation: &str, affected: u64) -> OrmResult<u64> {
        if affected == 1 {
            return Ok(affected);
        }
        match self.policy {
            RowCountPolicy::Lenient => {
                warn!(
                    table = %self.meta.table(),
                    operation,
                    affected,
                    "Unexpected affected row count"
                );
                Ok(affected)
            }
            RowCountPolicy::Strict => Err(OrmError::row_count(
                format!("{} on {}", operation, self.meta.table()),
                affected,
            )),
        }
    }
}

impl<M: Model> std::fmt::Debug for Table<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("model", &self.meta.model())
            .field("table", &self.meta.table())
            .field("policy", &self.policy)
            .finish()
    }
}
