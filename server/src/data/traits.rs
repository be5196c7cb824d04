//! Data source traits
//!
//! The filter orchestrator talks to storage only through `FilterDataSource`.
//! A `QueryPlan` is backend-neutral; each backend renders it with its own SQL
//! dialect and binds the predicate's values as parameters.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::data::error::DataError;
use crate::domain::filter::{OrderTerm, Predicate};

/// One decoded row. Relation columns are nested under the relation path.
pub type Record = Map<String, Value>;

/// Eager LEFT JOIN of a many-to-one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    /// Relation path, used as the key prefix for selected columns
    pub path: String,
    pub table: String,
    pub alias: String,
    pub parent_alias: String,
    /// Column on the parent
    pub local_key: String,
    /// Column on the joined table
    pub foreign_key: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

/// Backend-neutral description of one listing query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub table: String,
    pub alias: String,
    pub joins: Vec<JoinSpec>,
    pub predicate: Option<Predicate>,
    pub order: Vec<OrderTerm>,
    pub window: Option<Window>,
}

impl QueryPlan {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            joins: Vec::new(),
            predicate: None,
            order: Vec::new(),
            window: None,
        }
    }
}

/// Storage port used by the filter orchestrator
#[async_trait]
pub trait FilterDataSource: Send + Sync {
    /// Rows matching the plan's predicate, ignoring order and window
    async fn count(&self, plan: &QueryPlan) -> Result<u64, DataError>;

    /// Rows matching the plan, ordered and windowed
    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Record>, DataError>;
}
