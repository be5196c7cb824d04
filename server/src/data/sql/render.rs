//! Predicate and query plan rendering
//!
//! Turns predicate trees and query plans into SQL text for a dialect. User
//! values only ever reach the output as placeholders; the values themselves
//! are collected in [`SqlParams`] in placeholder order. Identifiers are
//! quoted segment by segment.

use serde_json::Value;

use super::SqlDialect;
use crate::data::traits::QueryPlan;
use crate::domain::filter::{ColumnRef, OrderTerm, Predicate};
use crate::utils::sql::escape_like_pattern;

/// Bound parameter values in placeholder order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlParams {
    pub values: Vec<Value>,
}

impl SqlParams {
    /// Push a value and return its placeholder
    fn bind(&mut self, dialect: &dyn SqlDialect, value: Value) -> String {
        self.values.push(value);
        dialect.placeholder(self.values.len())
    }
}

pub fn render_column(column: &ColumnRef, dialect: &dyn SqlDialect) -> String {
    column
        .segments()
        .iter()
        .map(|s| dialect.quote_identifier(s))
        .collect::<Vec<_>>()
        .join(".")
}

pub fn render_predicate(
    predicate: &Predicate,
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
) -> String {
    match predicate {
        Predicate::Comparison { column, op, value } => {
            let col = render_column(column, dialect);
            let ph = params.bind(dialect, value.clone());
            format!("{} {} {}", col, op.as_sql(), ph)
        }
        Predicate::Membership {
            column,
            values,
            negated,
        } => {
            if values.is_empty() {
                // IN () matches nothing, NOT IN () matches everything
                return if *negated { "1=1" } else { "1=0" }.to_string();
            }
            let col = render_column(column, dialect);
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| params.bind(dialect, v.clone()))
                .collect();
            let keyword = if *negated { "NOT IN" } else { "IN" };
            format!("{} {} ({})", col, keyword, placeholders.join(", "))
        }
        Predicate::Range { column, low, high } => {
            let col = render_column(column, dialect);
            let low = params.bind(dialect, low.clone());
            let high = params.bind(dialect, high.clone());
            format!("{} BETWEEN {} AND {}", col, low, high)
        }
        Predicate::Pattern {
            column,
            kind,
            needle,
        } => {
            let col = render_column(column, dialect);
            let pattern = kind.wrap(&escape_like_pattern(needle));
            let ph = params.bind(dialect, Value::String(pattern));
            dialect.ilike(&col, &ph)
        }
        Predicate::IsNull { column, negated } => {
            let col = render_column(column, dialect);
            if *negated {
                format!("{} IS NOT NULL", col)
            } else {
                format!("{} IS NULL", col)
            }
        }
        Predicate::And(parts) => render_group(parts, " AND ", "1=1", dialect, params),
        Predicate::Or(parts) => render_group(parts, " OR ", "1=0", dialect, params),
    }
}

fn render_group(
    parts: &[Predicate],
    separator: &str,
    empty: &str,
    dialect: &dyn SqlDialect,
    params: &mut SqlParams,
) -> String {
    if parts.is_empty() {
        return empty.to_string();
    }
    let rendered: Vec<String> = parts
        .iter()
        .map(|p| render_predicate(p, dialect, params))
        .collect();
    format!("({})", rendered.join(separator))
}

pub fn render_order(terms: &[OrderTerm], dialect: &dyn SqlDialect) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let rendered: Vec<String> = terms
        .iter()
        .map(|t| format!("{} {}", render_column(&t.column, dialect), t.direction.as_sql()))
        .collect();
    Some(format!("ORDER BY {}", rendered.join(", ")))
}

/// `FROM ... LEFT JOIN ... WHERE ...`, shared by select and count
fn render_source(plan: &QueryPlan, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
    let q = |s: &str| dialect.quote_identifier(s);
    let mut sql = format!("FROM {} AS {}", q(&plan.table), q(&plan.alias));
    for join in &plan.joins {
        sql.push_str(&format!(
            " LEFT JOIN {} AS {} ON {}.{} = {}.{}",
            q(&join.table),
            q(&join.alias),
            q(&join.alias),
            q(&join.foreign_key),
            q(&join.parent_alias),
            q(&join.local_key),
        ));
    }
    if let Some(predicate) = &plan.predicate {
        sql.push_str(" WHERE ");
        sql.push_str(&render_predicate(predicate, dialect, params));
    }
    sql
}

/// Full listing query: base columns, relation columns keyed by
/// `<path>.<column>`, filter, order and window
pub fn build_select(plan: &QueryPlan, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
    let q = |s: &str| dialect.quote_identifier(s);
    let mut columns = vec![format!("{}.*", q(&plan.alias))];
    for join in &plan.joins {
        for column in &join.columns {
            columns.push(format!(
                "{}.{} AS {}",
                q(&join.alias),
                q(column),
                q(&format!("{}.{}", join.path, column))
            ));
        }
    }

    let mut sql = format!(
        "SELECT {} {}",
        columns.join(", "),
        render_source(plan, dialect, params)
    );
    if let Some(order) = render_order(&plan.order, dialect) {
        sql.push(' ');
        sql.push_str(&order);
    }
    if let Some(window) = plan.window {
        sql.push(' ');
        sql.push_str(&dialect.limit_offset(window.limit, window.offset));
    }
    sql
}

pub fn build_count(plan: &QueryPlan, dialect: &dyn SqlDialect, params: &mut SqlParams) -> String {
    format!("SELECT COUNT(*) {}", render_source(plan, dialect, params))
}
