//! Predicate expression tree
//!
//! The compiler produces these immutable trees; the SQL renderer in
//! `data::sql` turns them into text with bound parameters. Values never
//! appear in identifiers, and identifiers are kept as separate segments so
//! the renderer can quote each one.

use std::fmt;

use serde_json::Value;

use super::types::SortDirection;

/// Possibly-qualified column reference, e.g. `a.name` or `unit.name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    segments: Vec<String>,
}

impl ColumnRef {
    /// Dotted fields are taken verbatim as a qualified path. Bare fields are
    /// qualified with `alias` (when non-empty).
    pub fn qualify(field: &str, alias: &str) -> Self {
        let segments = if field.contains('.') {
            field.split('.').map(str::to_string).collect()
        } else if alias.is_empty() {
            vec![field.to_string()]
        } else {
            vec![alias.to_string(), field.to_string()]
        };
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn column(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

/// Where the needle sits inside a case-insensitive LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Contains,
    StartsWith,
    EndsWith,
}

impl PatternKind {
    /// Wrap an already-escaped needle with `%` wildcards
    pub fn wrap(&self, escaped: &str) -> String {
        match self {
            Self::Contains => format!("%{}%", escaped),
            Self::StartsWith => format!("{}%", escaped),
            Self::EndsWith => format!("%{}", escaped),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Comparison {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    Membership {
        column: ColumnRef,
        values: Vec<Value>,
        negated: bool,
    },
    /// Inclusive on both ends
    Range {
        column: ColumnRef,
        low: Value,
        high: Value,
    },
    /// Case-insensitive LIKE. The needle is raw user text; escaping happens
    /// at render time.
    Pattern {
        column: ColumnRef,
        kind: PatternKind,
        needle: String,
    },
    IsNull {
        column: ColumnRef,
        negated: bool,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// AND together whatever is present. `None` when nothing is.
    pub fn all(parts: impl IntoIterator<Item = Option<Predicate>>) -> Option<Predicate> {
        let mut parts: Vec<Predicate> = parts.into_iter().flatten().collect();
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Predicate::And(parts)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: ColumnRef,
    pub direction: SortDirection,
}
