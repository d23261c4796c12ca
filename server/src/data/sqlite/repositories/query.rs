//! Ad-hoc statement execution and dynamic row decoding
//!
//! Statements are run as given. Cell values are decoded from SQLite's
//! runtime storage class, not the declared column type, so expression
//! columns such as `AVG(duration)` come back as `Real`.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Executor, Row, TypeInfo, ValueRef};

use crate::data::error::StoreError;
use crate::data::types::{SqlValue, Table};

fn bind_params<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &'q [SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Integer(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::Blob(v) => query.bind(v.as_slice()),
        };
    }
    query
}

/// Run a statement and return the driver rows untouched
pub async fn fetch_rows(
    conn: &mut SqliteConnection,
    statement: &str,
    params: &[SqlValue],
) -> Result<Vec<SqliteRow>, StoreError> {
    let rows = bind_params(sqlx::query(statement), params)
        .fetch_all(&mut *conn)
        .await?;
    tracing::trace!(rows = rows.len(), "Statement returned rows");
    Ok(rows)
}

/// Run a statement and decode its rows into a [`Table`]
///
/// When no rows come back, column names are taken from the prepared
/// statement so an empty result still carries its header.
pub async fn fetch_table(
    conn: &mut SqliteConnection,
    statement: &str,
    params: &[SqlValue],
) -> Result<Table, StoreError> {
    let rows = fetch_rows(conn, statement, params).await?;
    if rows.is_empty() {
        let describe = (&mut *conn).describe(statement).await?;
        let columns = describe
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        return Ok(Table {
            columns,
            rows: Vec::new(),
        });
    }
    rows_to_table(&rows)
}

/// Run a statement that returns no rows
pub async fn execute(
    conn: &mut SqliteConnection,
    statement: &str,
    params: &[SqlValue],
) -> Result<u64, StoreError> {
    let result = bind_params(sqlx::query(statement), params)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Decode driver rows into a [`Table`]
pub fn rows_to_table(rows: &[SqliteRow]) -> Result<Table, StoreError> {
    let columns = match rows.first() {
        Some(row) => row
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect(),
        None => Vec::new(),
    };

    let decoded = rows
        .iter()
        .map(|row| {
            (0..row.len())
                .map(|idx| decode_cell(row, idx))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Table {
        columns,
        rows: decoded,
    })
}

fn decode_cell(row: &SqliteRow, idx: usize) -> Result<SqlValue, StoreError> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let storage_class = raw.type_info().name().to_string();

    let value = match storage_class.as_str() {
        "INTEGER" | "BIGINT" | "BOOLEAN" => SqlValue::Integer(row.try_get_unchecked(idx)?),
        "REAL" | "NUMERIC" => SqlValue::Real(row.try_get_unchecked(idx)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(idx)?),
        _ => SqlValue::Text(row.try_get_unchecked(idx)?),
    };
    Ok(value)
}
