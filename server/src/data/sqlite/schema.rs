//! Span table DDL
//!
//! The table name is spliced in already quoted (see `utils::sql::quote_identifier`).

/// `CREATE TABLE IF NOT EXISTS` for the span table
pub fn create_span_table(quoted_table: &str) -> String {
    format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            trace_id TEXT NOT NULL,
            span_id TEXT NOT NULL,
            parent_span_id TEXT NULL,
            operation_name TEXT NOT NULL,
            start_time BIGINT NOT NULL,
            duration INTEGER NOT NULL,
            status_code TEXT NOT NULL,
            service_name TEXT NOT NULL
        )
        "#,
        quoted_table
    )
}

pub fn drop_span_table(quoted_table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quoted_table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_span_table_columns_in_order() {
        let ddl = create_span_table("\"t\"");
        let positions: Vec<usize> = crate::data::types::SPAN_COLUMNS
            .iter()
            .map(|c| ddl.find(&format!("{} ", c)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(ddl.contains("parent_span_id TEXT NULL"));
    }
}
