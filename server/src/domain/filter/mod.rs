//! Generic entity filtering
//!
//! - `types` - canonical condition, sort and pagination value objects
//! - `normalize` - lenient decoding of frontend filter input
//! - `predicate` - immutable predicate expression tree
//! - `compiler` - conditions to predicates, sort terms and global search
//! - `pagination` - page metadata and the paged envelope
//! - `entity` - per-entity configuration and registry
//! - `service` - orchestrates a listing against a data source

pub mod compiler;
pub mod entity;
pub mod normalize;
pub mod pagination;
pub mod predicate;
pub mod service;
pub mod types;

pub use compiler::{compile_global_search, compile_predicate, compile_sort};
pub use entity::{EntityConfig, EntityRegistry, Relation};
pub use normalize::{normalize_condition_logic, normalize_request};
pub use pagination::{Paginated, PaginationMeta, PaginationView};
pub use predicate::{ColumnRef, CompareOp, OrderTerm, PatternKind, Predicate};
pub use service::FilterService;
pub use types::{
    ConditionLogic, FieldType, FilterCondition, FilterOperator, FilterRequest, PaginationSpec,
    SortDirection, SortSpec,
};
