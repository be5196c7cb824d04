//! SQLite implementation of the filter data source

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row, Sqlite, SqlitePool, TypeInfo, ValueRef};

use crate::data::error::DataError;
use crate::data::sql::{SqlParams, SqliteDialect, build_count, build_select};
use crate::data::traits::{FilterDataSource, QueryPlan, Record};
use crate::utils::json::insert_path;

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

pub struct SqliteDataSource {
    pool: SqlitePool,
}

impl SqliteDataSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => query.bind(i),
            None => query.bind(n.as_f64()),
        },
        Value::String(s) => query.bind(s.clone()),
        other => query.bind(other.to_string()),
    }
}

fn bind_params<'q>(sql: &'q str, params: &SqlParams) -> SqliteQuery<'q> {
    params
        .values
        .iter()
        .fold(sqlx::query(sql), |query, value| bind_value(query, value))
}

/// Decode one column by the storage class of its value
fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" | "INT" | "BIGINT" => Value::from(row.try_get_unchecked::<i64, _>(index)?),
        "BOOLEAN" => Value::Bool(row.try_get_unchecked::<bool, _>(index)?),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            let f = row.try_get_unchecked::<f64, _>(index)?;
            Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
        }
        "BLOB" => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Value::String(row.try_get_unchecked::<String, _>(index)?),
    };
    Ok(value)
}

/// Decode a row into a record, nesting `path.column` keys into objects
fn decode_row(row: &SqliteRow) -> Result<Record, DataError> {
    let mut record = Record::new();
    for column in row.columns() {
        let value = decode_column(row, column.ordinal())
            .map_err(|e| DataError::decode(column.name(), e))?;
        insert_path(&mut record, column.name(), value);
    }
    Ok(record)
}

#[async_trait]
impl FilterDataSource for SqliteDataSource {
    async fn count(&self, plan: &QueryPlan) -> Result<u64, DataError> {
        let mut params = SqlParams::default();
        let sql = build_count(plan, &SqliteDialect, &mut params);
        tracing::debug!(%sql, params = params.values.len(), "Counting rows");

        let row = bind_params(&sql, &params)
            .fetch_one(&self.pool)
            .await
            .map_err(DataError::from_sqlite)?;
        let count: i64 = row.try_get(0).map_err(DataError::from_sqlite)?;
        Ok(count.max(0) as u64)
    }

    async fn fetch(&self, plan: &QueryPlan) -> Result<Vec<Record>, DataError> {
        let mut params = SqlParams::default();
        let sql = build_select(plan, &SqliteDialect, &mut params);
        tracing::debug!(%sql, params = params.values.len(), "Fetching rows");

        let rows = bind_params(&sql, &params)
            .fetch_all(&self.pool)
            .await
            .map_err(DataError::from_sqlite)?;
        rows.iter().map(decode_row).collect()
    }
}
