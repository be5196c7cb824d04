//! Filter orchestrator
//!
//! Builds a query plan for an entity from a canonical request, runs count and
//! fetch against the data source, and wraps the rows with pagination
//! metadata.

use std::sync::Arc;

use super::compiler::{compile_global_search, compile_predicate, compile_sort};
use super::entity::EntityConfig;
use super::pagination::Paginated;
use super::predicate::{OrderTerm, Predicate};
use super::types::{FilterCondition, FilterRequest, SortSpec};
use crate::data::error::DataError;
use crate::data::traits::{FilterDataSource, QueryPlan, Record, Window};

pub struct FilterService {
    source: Arc<dyn FilterDataSource>,
}

impl FilterService {
    pub fn new(source: Arc<dyn FilterDataSource>) -> Self {
        Self { source }
    }

    /// Plan for `request`, without the page window
    pub fn plan(&self, entity: &EntityConfig, request: &FilterRequest) -> QueryPlan {
        let alias = entity.alias();

        let conditions: Vec<FilterCondition> = request
            .conditions
            .iter()
            .filter(|c| {
                let allowed = entity.allows_field(&c.field);
                if !allowed {
                    tracing::debug!(
                        entity = %entity.name,
                        field = %c.field,
                        "Dropping condition on field outside allow-list"
                    );
                }
                allowed
            })
            .map(|c| FilterCondition {
                field: entity.resolve_field(&c.field),
                ..c.clone()
            })
            .collect();

        let compiled = compile_predicate(&conditions, request.condition_logic, alias);
        let search_fields: Vec<String> = entity
            .search_fields
            .iter()
            .map(|f| entity.resolve_field(f))
            .collect();
        let search = request
            .search
            .as_deref()
            .and_then(|term| compile_global_search(term, &search_fields, alias));

        let mut plan = self.base_plan(entity);
        plan.predicate = Predicate::all([entity.scope_predicate(), compiled, search]);
        plan.order = self.order_for(entity, &request.sorting, &conditions);
        plan
    }

    fn base_plan(&self, entity: &EntityConfig) -> QueryPlan {
        let mut plan = QueryPlan::new(entity.table.clone(), entity.alias());
        plan.joins = entity.join_specs();
        plan
    }

    /// Explicit sorting, else per-condition sort hints in condition order,
    /// else the entity default
    fn order_for(
        &self,
        entity: &EntityConfig,
        sorting: &[SortSpec],
        conditions: &[FilterCondition],
    ) -> Vec<OrderTerm> {
        let sorting: Vec<SortSpec> = sorting
            .iter()
            .filter(|s| entity.allows_field(&s.field))
            .map(|s| SortSpec {
                field: entity.resolve_field(&s.field),
                ..s.clone()
            })
            .collect();
        if !sorting.is_empty() {
            return compile_sort(&sorting, entity.alias());
        }

        let hints: Vec<SortSpec> = conditions
            .iter()
            .enumerate()
            .filter_map(|(i, c)| {
                c.sort.map(|direction| {
                    SortSpec::new(c.field.clone(), direction, i32::try_from(i).unwrap_or(i32::MAX))
                })
            })
            .collect();
        if !hints.is_empty() {
            return compile_sort(&hints, entity.alias());
        }

        entity
            .default_sort_spec()
            .map(|spec| {
                let spec = SortSpec {
                    field: entity.resolve_field(&spec.field),
                    ..spec
                };
                compile_sort(&[spec], entity.alias())
            })
            .unwrap_or_default()
    }

    /// One page of `entity` matching `request`, each row passed through `map`
    pub async fn find_with_filters<T, F>(
        &self,
        entity: &EntityConfig,
        request: &FilterRequest,
        map: F,
    ) -> Result<Paginated<T>, DataError>
    where
        F: Fn(Record) -> T + Send + Sync,
        T: Send,
    {
        let page = request.pagination.current_page;
        let limit = request.pagination.items_per_page;

        let mut plan = self.plan(entity, request);
        plan.window = Some(Window {
            offset: request.pagination.offset(),
            limit: u64::from(limit),
        });

        let total = self.source.count(&plan).await?;
        let rows = self.source.fetch(&plan).await?;
        tracing::debug!(
            entity = %entity.name,
            total,
            returned = rows.len(),
            page,
            limit,
            "Filtered listing"
        );

        let data = rows.into_iter().map(map).collect();
        Ok(Paginated::new(data, page, limit, total))
    }

    /// Every row of `entity` in default order, without pagination
    pub async fn find_all<T, F>(&self, entity: &EntityConfig, map: F) -> Result<Vec<T>, DataError>
    where
        F: Fn(Record) -> T + Send + Sync,
        T: Send,
    {
        let mut plan = self.base_plan(entity);
        plan.predicate = entity.scope_predicate();
        plan.order = self.order_for(entity, &[], &[]);

        let rows = self.source.fetch(&plan).await?;
        tracing::debug!(entity = %entity.name, returned = rows.len(), "Unfiltered listing");
        Ok(rows.into_iter().map(map).collect())
    }
}
