//! Dynamic record access over the backing SQLite store.
//!
//! Every statement is assembled at runtime from the caller's filter set and
//! column list, so this layer works uniformly across all backing tables
//! (including passthrough names the proxy does not recognize). Rows travel
//! as JSON objects keyed by the internal camelCase column names; the
//! external contract is the translator's concern, not this layer's.

use serde_json::{Map, Value};
use sqlx::{
    Column, QueryBuilder, Row, Sqlite, SqlitePool, TypeInfo, ValueRef, sqlite::SqliteRow,
};
use thiserror::Error;

/// A record as stored: internal camelCase keys, JSON values.
pub type JsonRow = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("unsupported value for column {0}")]
    UnsupportedValue(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
    Neq,
}

impl FilterOp {
    fn sql(self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
            FilterOp::Neq => "<>",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: Value) -> Self {
        Self {
            column: column.into(),
            op,
            value,
        }
    }

    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub column: String,
    pub descending: bool,
}

#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        sort: Option<&Sort>,
    ) -> Result<Vec<JsonRow>, StoreError> {
        check_identifier(table)?;
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM \"{table}\""));
        push_where(&mut qb, filters)?;
        if let Some(sort) = sort {
            check_identifier(&sort.column)?;
            qb.push(format!(
                " ORDER BY \"{}\" {}",
                sort.column,
                if sort.descending { "DESC" } else { "ASC" }
            ));
        }
        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    pub async fn insert(&self, table: &str, row: &JsonRow) -> Result<JsonRow, StoreError> {
        check_identifier(table)?;
        let mut qb = if row.is_empty() {
            QueryBuilder::<Sqlite>::new(format!("INSERT INTO \"{table}\" DEFAULT VALUES"))
        } else {
            let mut qb = QueryBuilder::<Sqlite>::new(format!("INSERT INTO \"{table}\" ("));
            for (i, column) in row.keys().enumerate() {
                check_identifier(column)?;
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(format!("\"{column}\""));
            }
            qb.push(") VALUES (");
            for (i, (column, value)) in row.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_bind_value(&mut qb, column, value)?;
            }
            qb.push(")");
            qb
        };
        qb.push(" RETURNING *");
        let row = qb.build().fetch_one(&self.pool).await?;
        decode_row(&row)
    }

    /// Update a single record by numeric id and return it re-read, so the
    /// trigger-maintained `updatedAt` is reflected in the result.
    pub async fn update_by_id(
        &self,
        table: &str,
        id: i64,
        changes: &JsonRow,
    ) -> Result<JsonRow, StoreError> {
        check_identifier(table)?;
        if !changes.is_empty() {
            let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE \"{table}\" SET "));
            push_assignments(&mut qb, changes)?;
            qb.push(" WHERE \"id\" = ");
            qb.push_bind(id);
            qb.build().execute(&self.pool).await?;
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM \"{table}\" WHERE \"id\" = "));
        qb.push_bind(id);
        let row = qb.build().fetch_one(&self.pool).await?;
        decode_row(&row)
    }

    /// Bulk update every record matching `filters`; returns the affected
    /// row count.
    pub async fn update_where(
        &self,
        table: &str,
        changes: &JsonRow,
        filters: &[Filter],
    ) -> Result<u64, StoreError> {
        check_identifier(table)?;
        if changes.is_empty() {
            return Ok(0);
        }
        let mut qb = QueryBuilder::<Sqlite>::new(format!("UPDATE \"{table}\" SET "));
        push_assignments(&mut qb, changes)?;
        push_where(&mut qb, filters)?;
        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Delete a single record by numeric id, returning the deleted row.
    pub async fn delete_by_id(&self, table: &str, id: i64) -> Result<JsonRow, StoreError> {
        check_identifier(table)?;
        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("DELETE FROM \"{table}\" WHERE \"id\" = "));
        qb.push_bind(id);
        qb.push(" RETURNING *");
        let row = qb.build().fetch_one(&self.pool).await?;
        decode_row(&row)
    }
}

/// Identifiers are interpolated into SQL (bind parameters cannot name
/// tables or columns), so they must stay within `[A-Za-z_][A-Za-z0-9_]*`.
fn check_identifier(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

fn push_where(
    qb: &mut QueryBuilder<'_, Sqlite>,
    filters: &[Filter],
) -> Result<(), StoreError> {
    for (i, filter) in filters.iter().enumerate() {
        check_identifier(&filter.column)?;
        qb.push(if i == 0 { " WHERE " } else { " AND " });
        qb.push(format!("\"{}\" {} ", filter.column, filter.op.sql()));
        push_bind_value(qb, &filter.column, &filter.value)?;
    }
    Ok(())
}

fn push_assignments(
    qb: &mut QueryBuilder<'_, Sqlite>,
    changes: &JsonRow,
) -> Result<(), StoreError> {
    for (i, (column, value)) in changes.iter().enumerate() {
        check_identifier(column)?;
        if i > 0 {
            qb.push(", ");
        }
        qb.push(format!("\"{column}\" = "));
        push_bind_value(qb, column, value)?;
    }
    Ok(())
}

fn push_bind_value(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &str,
    value: &Value,
) -> Result<(), StoreError> {
    match value {
        Value::Null => {
            qb.push_bind(None::<String>);
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                qb.push_bind(f);
            } else {
                return Err(StoreError::UnsupportedValue(column.to_string()));
            }
        }
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        Value::Array(_) | Value::Object(_) => {
            return Err(StoreError::UnsupportedValue(column.to_string()));
        }
    }
    Ok(())
}

/// Decode a row into JSON using each column's declared type, so BOOLEAN
/// columns come back as JSON booleans rather than 0/1.
fn decode_row(row: &SqliteRow) -> Result<JsonRow, StoreError> {
    let mut out = JsonRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "BOOLEAN" => Value::Bool(row.try_get(i)?),
                "INTEGER" | "INT" | "BIGINT" => Value::from(row.try_get::<i64, _>(i)?),
                "REAL" | "NUMERIC" => Value::from(row.try_get::<f64, _>(i)?),
                _ => Value::String(row.try_get::<String, _>(i)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
