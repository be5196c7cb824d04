//! Predicate compiler
//!
//! Compiles canonical conditions into a predicate tree against a table alias.
//! Conditions are combined positionally: the first one that produces an
//! expression is the base and each later one attaches with AND or OR. The
//! resulting chain reads the way SQL reads `a AND b OR c`, so AND binds
//! tighter than OR, and the whole chain sits inside a single outer AND group
//! so it composes safely with other predicates.

use serde_json::Value;

use super::predicate::{ColumnRef, CompareOp, OrderTerm, PatternKind, Predicate};
use super::types::{ConditionLogic, FieldType, FilterCondition, FilterOperator, SortSpec};

/// How a condition attaches to the chain built so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

/// Connector for a non-first condition.
///
/// CONTAINS over TEXT always attaches with OR under OR or CONTAINS logic,
/// regardless of its position.
pub fn connector_for(condition: &FilterCondition, logic: ConditionLogic) -> Connector {
    let text_contains = condition.operator == FilterOperator::Contains
        && condition.field_type == FieldType::Text;
    match logic {
        ConditionLogic::Or => Connector::Or,
        ConditionLogic::Contains if text_contains => Connector::Or,
        _ => Connector::And,
    }
}

/// Compile a list of conditions into one predicate.
///
/// Returns `None` when no condition contributes anything.
pub fn compile_predicate(
    conditions: &[FilterCondition],
    logic: ConditionLogic,
    alias: &str,
) -> Option<Predicate> {
    // OR-separated groups of AND-ed terms
    let mut groups: Vec<Vec<Predicate>> = Vec::new();

    for condition in conditions {
        if condition.field.trim().is_empty() {
            tracing::trace!("Skipping condition with blank field");
            continue;
        }
        let Some(expr) = compile_condition(condition, alias) else {
            tracing::trace!(
                field = %condition.field,
                operator = condition.operator.as_str(),
                "Condition contributes nothing"
            );
            continue;
        };
        match groups.last_mut() {
            Some(group) if connector_for(condition, logic) == Connector::And => group.push(expr),
            _ => groups.push(vec![expr]),
        }
    }

    let mut disjuncts: Vec<Predicate> = groups
        .into_iter()
        .map(|mut group| {
            if group.len() == 1 {
                group.remove(0)
            } else {
                Predicate::And(group)
            }
        })
        .collect();

    let chain = match disjuncts.len() {
        0 => return None,
        1 => disjuncts.remove(0),
        _ => Predicate::Or(disjuncts),
    };
    Some(Predicate::And(vec![chain]))
}

/// Compile one condition: the operator branch plus, for DATE fields with
/// both bounds, an inclusive date range. The range is not repeated when the
/// operator branch already produced exactly that range.
pub fn compile_condition(condition: &FilterCondition, alias: &str) -> Option<Predicate> {
    let column = ColumnRef::qualify(&condition.field, alias);
    let primary = compile_operator(condition, &column);
    let date_range = condition.date_bounds().map(|(from, to)| Predicate::Range {
        column: column.clone(),
        low: Value::String(from.to_string()),
        high: Value::String(to.to_string()),
    });

    match (primary, date_range) {
        (Some(p), Some(r)) if p == r => Some(p),
        (Some(p), Some(r)) => Some(Predicate::And(vec![p, r])),
        (p, r) => p.or(r),
    }
}

fn compile_operator(condition: &FilterCondition, column: &ColumnRef) -> Option<Predicate> {
    let values = &condition.value;
    let first = values.first();

    match condition.operator {
        FilterOperator::Equals => match values.len() {
            0 => None,
            1 => Some(comparison(column, CompareOp::Eq, &values[0])),
            _ => Some(membership(column, values, false)),
        },
        FilterOperator::Contains => match condition.field_type {
            FieldType::Text => {
                let mut patterns: Vec<Predicate> = values
                    .iter()
                    .filter_map(value_text)
                    .map(|needle| pattern(column, PatternKind::Contains, needle))
                    .collect();
                match patterns.len() {
                    0 => None,
                    1 => patterns.pop(),
                    _ => Some(Predicate::Or(patterns)),
                }
            }
            FieldType::Select if !values.is_empty() => Some(membership(column, values, false)),
            _ => None,
        },
        FilterOperator::StartsWith => first
            .and_then(value_text)
            .map(|needle| pattern(column, PatternKind::StartsWith, needle)),
        FilterOperator::EndsWith => first
            .and_then(value_text)
            .map(|needle| pattern(column, PatternKind::EndsWith, needle)),
        FilterOperator::GreaterThan => first.map(|v| comparison(column, CompareOp::Gt, v)),
        FilterOperator::GreaterThanOrEqual => first.map(|v| comparison(column, CompareOp::Gte, v)),
        FilterOperator::LessThan => first.map(|v| comparison(column, CompareOp::Lt, v)),
        FilterOperator::LessThanOrEqual => first.map(|v| comparison(column, CompareOp::Lte, v)),
        FilterOperator::In if !values.is_empty() => Some(membership(column, values, false)),
        FilterOperator::NotIn if !values.is_empty() => Some(membership(column, values, true)),
        FilterOperator::In | FilterOperator::NotIn => None,
        FilterOperator::Between => {
            if let Some((from, to)) = condition.date_bounds() {
                Some(Predicate::Range {
                    column: column.clone(),
                    low: Value::String(from.to_string()),
                    high: Value::String(to.to_string()),
                })
            } else if values.len() >= 2 {
                Some(Predicate::Range {
                    column: column.clone(),
                    low: values[0].clone(),
                    high: values[1].clone(),
                })
            } else {
                None
            }
        }
    }
}

/// Text form of a value used inside LIKE patterns. Nulls contribute nothing.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn comparison(column: &ColumnRef, op: CompareOp, value: &Value) -> Predicate {
    Predicate::Comparison {
        column: column.clone(),
        op,
        value: value.clone(),
    }
}

fn membership(column: &ColumnRef, values: &[Value], negated: bool) -> Predicate {
    Predicate::Membership {
        column: column.clone(),
        values: values.to_vec(),
        negated,
    }
}

fn pattern(column: &ColumnRef, kind: PatternKind, needle: String) -> Predicate {
    Predicate::Pattern {
        column: column.clone(),
        kind,
        needle,
    }
}

/// Order terms sorted by ascending priority. Ties keep their input order.
pub fn compile_sort(specs: &[SortSpec], alias: &str) -> Vec<OrderTerm> {
    let mut ordered: Vec<&SortSpec> = specs
        .iter()
        .filter(|s| !s.field.trim().is_empty())
        .collect();
    ordered.sort_by_key(|s| s.priority);
    ordered
        .into_iter()
        .map(|s| OrderTerm {
            column: ColumnRef::qualify(s.field.trim(), alias),
            direction: s.direction,
        })
        .collect()
}

/// One OR group of case-insensitive `%term%` matches across `fields`
pub fn compile_global_search(term: &str, fields: &[String], alias: &str) -> Option<Predicate> {
    let term = term.trim();
    if term.is_empty() {
        return None;
    }
    let patterns: Vec<Predicate> = fields
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| {
            pattern(
                &ColumnRef::qualify(f.trim(), alias),
                PatternKind::Contains,
                term.to_string(),
            )
        })
        .collect();
    if patterns.is_empty() {
        None
    } else {
        Some(Predicate::Or(patterns))
    }
}
