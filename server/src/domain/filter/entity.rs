//! Per-entity filter configuration
//!
//! Each listable entity declares its table, alias, searchable columns, field
//! types, eager relations and projection. Configs are loaded once at startup
//! and shared immutably between requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::predicate::{ColumnRef, Predicate};
use super::types::{ConditionLogic, FieldType, SortDirection, SortSpec};
use crate::core::constants::DEFAULT_ITEMS_PER_PAGE;
use crate::data::traits::{JoinSpec, Record};
use crate::utils::json::{insert_path, lookup_path};

fn default_limit() -> u32 {
    DEFAULT_ITEMS_PER_PAGE
}

fn default_foreign_key() -> String {
    "id".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultSort {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Many-to-one relation joined eagerly into every listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// `unit`, or one level nested: `unit.building`
    pub path: String,
    pub table: String,
    /// Column on the parent holding the reference. Defaults to `<alias>_id`.
    #[serde(default)]
    pub local_key: Option<String>,
    #[serde(default = "default_foreign_key")]
    pub foreign_key: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

impl Relation {
    /// Join alias: the last path segment
    pub fn alias(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Path of the relation this one hangs off, if nested
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    pub fn local_key(&self) -> String {
        self.local_key
            .clone()
            .unwrap_or_else(|| format!("{}_id", self.alias()))
    }

    pub fn depth(&self) -> usize {
        self.path.split('.').count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Route segment under `/entities/`
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub field_types: HashMap<String, FieldType>,
    #[serde(default)]
    pub default_sorting: Option<DefaultSort>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    /// Projection allow-list. Empty keeps every column.
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub soft_delete_column: Option<String>,
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    #[serde(default)]
    pub default_logic: ConditionLogic,
}

impl EntityConfig {
    pub fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether a condition or sort may target `field`.
    ///
    /// Everything is allowed when no allow-list is configured. Otherwise the
    /// field must be listed, typed, searchable, or a declared relation column.
    pub fn allows_field(&self, field: &str) -> bool {
        if self.fields.is_empty() {
            return true;
        }
        if self.fields.iter().any(|f| f == field)
            || self.field_types.contains_key(field)
            || self.search_fields.iter().any(|f| f == field)
        {
            return true;
        }
        let Some((prefix, column)) = field.rsplit_once('.') else {
            return false;
        };
        let relation_alias = prefix.rsplit('.').next().unwrap_or(prefix);
        self.relations
            .iter()
            .any(|r| r.alias() == relation_alias && r.columns.iter().any(|c| c == column))
    }

    /// Rewrite `unit.building.name` to `building.name` when `unit.building` is
    /// a declared relation, so the column is addressed through its join
    /// alias. Any other field is returned unchanged.
    pub fn resolve_field(&self, field: &str) -> String {
        let Some((prefix, column)) = field.rsplit_once('.') else {
            return field.to_string();
        };
        match self.relations.iter().find(|r| r.path == prefix) {
            Some(relation) => format!("{}.{}", relation.alias(), column),
            None => field.to_string(),
        }
    }

    pub fn default_sort_spec(&self) -> Option<SortSpec> {
        self.default_sorting
            .as_ref()
            .map(|s| SortSpec::new(s.field.clone(), s.direction, 0))
    }

    /// `<alias>.<column> IS NULL` when the entity is soft-deletable
    pub fn scope_predicate(&self) -> Option<Predicate> {
        self.soft_delete_column.as_ref().map(|column| Predicate::IsNull {
            column: ColumnRef::qualify(column, self.alias()),
            negated: false,
        })
    }

    /// Join specs for every relation, parents before children
    pub fn join_specs(&self) -> Vec<JoinSpec> {
        let mut relations: Vec<&Relation> = self.relations.iter().collect();
        relations.sort_by_key(|r| r.depth());
        relations
            .into_iter()
            .map(|r| {
                let parent_alias = r
                    .parent_path()
                    .map(|p| p.rsplit('.').next().unwrap_or(p).to_string())
                    .unwrap_or_else(|| self.alias().to_string());
                JoinSpec {
                    path: r.path.clone(),
                    table: r.table.clone(),
                    alias: r.alias().to_string(),
                    parent_alias,
                    local_key: r.local_key(),
                    foreign_key: r.foreign_key.clone(),
                    columns: r.columns.clone(),
                }
            })
            .collect()
    }

    /// Apply the projection allow-list to a decoded row
    pub fn project(&self, record: Record) -> Record {
        if self.fields.is_empty() {
            return record;
        }
        let mut projected = Record::new();
        for field in &self.fields {
            let value = lookup_path(&record, field).cloned().unwrap_or(Value::Null);
            insert_path(&mut projected, field, value);
        }
        projected
    }
}

/// Entity configs keyed by route name
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, EntityConfig>,
}

impl EntityRegistry {
    pub fn new(entities: impl IntoIterator<Item = EntityConfig>) -> Self {
        Self {
            entities: entities.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset_config() -> EntityConfig {
        serde_json::from_value(json!({
            "name": "assets",
            "table": "assets",
            "alias": "a",
            "search_fields": ["name", "serial"],
            "field_types": {"price": "number"},
            "default_sorting": {"field": "name", "direction": "desc"},
            "relations": [
                {"path": "unit.building", "table": "buildings", "columns": ["name"]},
                {"path": "unit", "table": "units", "columns": ["name", "code"]}
            ],
            "fields": ["id", "name", "unit.name"],
            "soft_delete_column": "deleted_at"
        }))
        .unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config: EntityConfig =
            serde_json::from_value(json!({"name": "units", "table": "units"})).unwrap();
        assert_eq!(config.alias(), "units");
        assert_eq!(config.default_limit, 20);
        assert_eq!(config.default_logic, ConditionLogic::And);
        assert!(config.scope_predicate().is_none());
        assert!(config.default_sort_spec().is_none());
        assert!(config.allows_field("anything"));
    }

    #[test]
    fn test_relation_keys() {
        let config = asset_config();
        let joins = config.join_specs();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[0].alias, "unit");
        assert_eq!(joins[0].parent_alias, "a");
        assert_eq!(joins[0].local_key, "unit_id");
        assert_eq!(joins[0].foreign_key, "id");
        assert_eq!(joins[1].alias, "building");
        assert_eq!(joins[1].parent_alias, "unit");
        assert_eq!(joins[1].path, "unit.building");
    }

    #[test]
    fn test_allows_field() {
        let config = asset_config();
        assert!(config.allows_field("name"));
        assert!(config.allows_field("price"));
        assert!(config.allows_field("serial"));
        assert!(config.allows_field("unit.code"));
        assert!(config.allows_field("building.name"));
        assert!(config.allows_field("unit.building.name"));
        assert!(!config.allows_field("password_hash"));
        assert!(!config.allows_field("unit.secret"));
    }

    #[test]
    fn test_resolve_field_through_join_alias() {
        let config = asset_config();
        assert_eq!(config.resolve_field("unit.building.name"), "building.name");
        assert_eq!(config.resolve_field("unit.name"), "unit.name");
        assert_eq!(config.resolve_field("name"), "name");
        assert_eq!(config.resolve_field("other.thing.name"), "other.thing.name");
    }

    #[test]
    fn test_scope_and_default_sort() {
        let config = asset_config();
        assert_eq!(
            config.scope_predicate(),
            Some(Predicate::IsNull {
                column: ColumnRef::qualify("deleted_at", "a"),
                negated: false,
            })
        );
        assert_eq!(
            config.default_sort_spec(),
            Some(SortSpec::new("name", SortDirection::Desc, 0))
        );
    }

    #[test]
    fn test_project() {
        let config = asset_config();
        let record = json!({
            "id": 1,
            "name": "Laptop",
            "serial": "X1",
            "unit": {"name": "IT", "code": "U1"}
        });
        let Value::Object(record) = record else {
            unreachable!()
        };
        let projected = config.project(record);
        assert_eq!(
            Value::Object(projected),
            json!({"id": 1, "name": "Laptop", "unit": {"name": "IT"}})
        );
    }

    #[test]
    fn test_registry() {
        let registry = EntityRegistry::new([asset_config()]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert!(registry.get("assets").is_some());
        assert!(registry.get("repairs").is_none());
        assert_eq!(registry.names(), vec!["assets"]);
    }
}
