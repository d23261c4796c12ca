//! Span table operations

use sqlx::sqlite::SqliteConnection;
use sqlx::{QueryBuilder, Sqlite};

use crate::core::constants::INSERT_BATCH_ROWS;
use crate::data::error::StoreError;
use crate::data::sqlite::schema::{create_span_table, drop_span_table};
use crate::data::types::{IfExists, SPAN_COLUMNS, SpanRecord};

/// Check whether a table exists (`table` is the bare, unquoted name)
///
/// SQLite resolves table names case-insensitively, so the lookup does too.
pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool, StoreError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
    )
    .bind(table)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count > 0)
}

pub async fn count_rows(conn: &mut SqliteConnection, quoted: &str) -> Result<i64, StoreError> {
    let sql = format!("SELECT COUNT(*) FROM {}", quoted);
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(&mut *conn).await?;
    Ok(count)
}

pub async fn create_table(conn: &mut SqliteConnection, quoted: &str) -> Result<(), StoreError> {
    sqlx::query(&create_span_table(quoted))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn drop_table(conn: &mut SqliteConnection, quoted: &str) -> Result<(), StoreError> {
    sqlx::query(&drop_span_table(quoted))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Insert rows with multi-row INSERT statements, one statement per batch
///
/// Each statement auto-commits, so a failure part-way leaves earlier
/// batches in place.
pub async fn insert_spans(
    conn: &mut SqliteConnection,
    quoted: &str,
    rows: &[SpanRecord],
) -> Result<u64, StoreError> {
    let mut written = 0;
    for chunk in rows.chunks(INSERT_BATCH_ROWS) {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) ",
            quoted,
            SPAN_COLUMNS.join(", ")
        ));
        builder.push_values(chunk, |mut b, row| {
            b.push_bind(row.trace_id.as_str())
                .push_bind(row.span_id.as_str())
                .push_bind(row.parent_span_id.as_deref())
                .push_bind(row.operation_name.as_str())
                .push_bind(row.start_time)
                .push_bind(row.duration)
                .push_bind(row.status_code.as_str())
                .push_bind(row.service_name.as_str());
        });
        let result = builder.build().execute(&mut *conn).await?;
        written += result.rows_affected();
    }
    Ok(written)
}

/// Write rows to a table under an if-exists policy
pub async fn persist_spans(
    conn: &mut SqliteConnection,
    table: &str,
    quoted: &str,
    rows: &[SpanRecord],
    policy: IfExists,
) -> Result<u64, StoreError> {
    match policy {
        IfExists::Fail => {
            if table_exists(conn, table).await? {
                let count = count_rows(conn, quoted).await?;
                if count > 0 {
                    return Err(StoreError::TableNotEmpty {
                        table: table.to_string(),
                        rows: count,
                    });
                }
            }
        }
        IfExists::Replace => drop_table(conn, quoted).await?,
        IfExists::Append => {}
    }

    create_table(conn, quoted).await?;
    let written = insert_spans(conn, quoted, rows).await?;

    tracing::debug!(table, rows = written, policy = %policy, "Persisted spans");
    Ok(written)
}

/// Read every row of a span table into typed records
pub async fn select_spans(
    conn: &mut SqliteConnection,
    quoted: &str,
) -> Result<Vec<SpanRecord>, StoreError> {
    let sql = format!("SELECT {} FROM {}", SPAN_COLUMNS.join(", "), quoted);
    let rows = sqlx::query_as::<_, SpanRecord>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    fn span(n: usize) -> SpanRecord {
        SpanRecord {
            trace_id: format!("trace-{}", n / 10),
            span_id: format!("span-{}", n),
            parent_span_id: None,
            operation_name: "op".to_string(),
            start_time: 1_750_618_321_000_000 + n as i64,
            duration: n as i64,
            status_code: String::new(),
            service_name: String::new(),
        }
    }

    async fn setup_conn() -> SqliteConnection {
        SqliteConnection::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_table_exists() {
        let mut conn = setup_conn().await;
        assert!(!table_exists(&mut conn, "spans").await.unwrap());
        create_table(&mut conn, "\"spans\"").await.unwrap();
        assert!(table_exists(&mut conn, "spans").await.unwrap());
        drop_table(&mut conn, "\"spans\"").await.unwrap();
        assert!(!table_exists(&mut conn, "spans").await.unwrap());
    }

    #[tokio::test]
    async fn test_table_exists_ignores_case() {
        let mut conn = setup_conn().await;
        create_table(&mut conn, "\"otel_traces\"").await.unwrap();
        assert!(table_exists(&mut conn, "OTEL_TRACES").await.unwrap());
        assert!(table_exists(&mut conn, "Otel_Traces").await.unwrap());
    }

    #[tokio::test]
    async fn test_fail_policy_sees_differently_cased_table() {
        let mut conn = setup_conn().await;
        persist_spans(
            &mut conn,
            "otel_traces",
            "\"otel_traces\"",
            &[span(1)],
            IfExists::Append,
        )
        .await
        .unwrap();

        let err = persist_spans(
            &mut conn,
            "OTEL_TRACES",
            "\"OTEL_TRACES\"",
            &[span(2)],
            IfExists::Fail,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::TableNotEmpty { rows: 1, .. }));
        assert_eq!(count_rows(&mut conn, "\"otel_traces\"").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_spans_multiple_batches() {
        let mut conn = setup_conn().await;
        create_table(&mut conn, "\"spans\"").await.unwrap();

        let rows: Vec<SpanRecord> = (0..INSERT_BATCH_ROWS * 2 + 7).map(span).collect();
        let written = insert_spans(&mut conn, "\"spans\"", &rows).await.unwrap();
        assert_eq!(written as usize, rows.len());
        assert_eq!(
            count_rows(&mut conn, "\"spans\"").await.unwrap() as usize,
            rows.len()
        );
    }

    #[tokio::test]
    async fn test_not_null_columns_enforced() {
        let mut conn = setup_conn().await;
        create_table(&mut conn, "\"spans\"").await.unwrap();
        let result = sqlx::query("INSERT INTO spans (trace_id) VALUES ('t')")
            .execute(&mut conn)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_select_spans_preserves_null_parent() {
        let mut conn = setup_conn().await;
        let mut child = span(2);
        child.parent_span_id = Some("span-1".to_string());
        let rows = vec![span(1), child];
        persist_spans(&mut conn, "spans", "\"spans\"", &rows, IfExists::Append)
            .await
            .unwrap();
        let read = select_spans(&mut conn, "\"spans\"").await.unwrap();
        assert_eq!(read, rows);
    }
}
