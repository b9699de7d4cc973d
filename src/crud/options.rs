use crate::db::Limit;
use crate::models::Value;

/// Optional clauses of a `find_all` query, appended in the order
/// `where`, `order by`, `limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) filter: Option<String>,
    pub(crate) args: Vec<Value>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: Option<Limit>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// SQL condition with portable `?` placeholders, and its arguments.
    pub fn filter(mut self, condition: impl Into<String>, args: Vec<Value>) -> Self {
        self.filter = Some(condition.into());
        self.args = args;
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Append the configured clauses to a SELECT.
    pub(crate) fn apply(&self, sql: &mut String) {
        if let Some(filter) = &self.filter {
            sql.push_str(" where ");
            sql.push_str(filter);
        }
        if let Some(order_by) = &self.order_by {
            sql.push_str(" order by ");
            sql.push_str(order_by);
        }
    }
}
