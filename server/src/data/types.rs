//! Shared row and result types

use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

/// Column order of the span table. Fixed; both DDL and inserts follow it.
pub const SPAN_COLUMNS: [&str; 8] = [
    "trace_id",
    "span_id",
    "parent_span_id",
    "operation_name",
    "start_time",
    "duration",
    "status_code",
    "service_name",
];

/// One flattened span, the unit persisted to the span table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct SpanRecord {
    pub trace_id: String,
    pub span_id: String,
    /// Absent for root spans
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    /// Microseconds since Unix epoch
    pub start_time: i64,
    /// Microseconds, never negative
    pub duration: i64,
    /// Value of the `otel.status_code` tag, empty when untagged
    pub status_code: String,
    /// Empty when the span's process is unknown
    pub service_name: String,
}

/// What `persist` does when the target table already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    /// Error if the table exists and holds rows
    Fail,
    /// Drop and recreate the table
    Replace,
    /// Add rows to the existing table
    #[default]
    Append,
}

impl fmt::Display for IfExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fail => write!(f, "fail"),
            Self::Replace => write!(f, "replace"),
            Self::Append => write!(f, "append"),
        }
    }
}

/// A single SQL value, used both for bind parameters and result cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Integer(v) => write!(f, "{}", v),
            Self::Real(v) => write!(f, "{:?}", v),
            Self::Text(v) => write!(f, "{}", v),
            Self::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Tabular query result: column names plus row-major cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &cells {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in &cells {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:<w$}", c, w = *w))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        write!(f, "({} rows)", self.rows.len())
    }
}

/// Requested shape of a query result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResultShape {
    /// Driver rows, undecoded
    Raw,
    /// Decoded into a [`Table`]
    #[default]
    Table,
}

/// Result of [`TraceStore::query`](crate::data::TraceStore::query)
pub enum QueryOutput {
    Raw(Vec<SqliteRow>),
    Table(Table),
}

impl fmt::Debug for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(rows) => f.debug_struct("Raw").field("rows", &rows.len()).finish(),
            Self::Table(table) => f.debug_tuple("Table").field(table).finish(),
        }
    }
}

impl QueryOutput {
    pub fn row_count(&self) -> usize {
        match self {
            Self::Raw(rows) => rows.len(),
            Self::Table(table) => table.len(),
        }
    }

    /// The tabular result, if this output was requested as a table
    pub fn into_table(self) -> Option<Table> {
        match self {
            Self::Table(table) => Some(table),
            Self::Raw(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_exists_serde() {
        let policy: IfExists = serde_json::from_str(r#""replace""#).unwrap();
        assert_eq!(policy, IfExists::Replace);
        assert_eq!(IfExists::default(), IfExists::Append);
        assert_eq!(IfExists::Fail.to_string(), "fail");
    }

    #[test]
    fn test_sql_value_from_json() {
        let values: Vec<SqlValue> = serde_json::from_str(r#"[null, 3, 2.5, "svc"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::Null,
                SqlValue::Integer(3),
                SqlValue::Real(2.5),
                SqlValue::Text("svc".to_string()),
            ]
        );
    }

    #[test]
    fn test_sql_value_to_json() {
        let json = serde_json::to_string(&vec![
            SqlValue::Null,
            SqlValue::Integer(150),
            SqlValue::Real(225.0),
            SqlValue::Text("OK".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,150,225.0,"OK"]"#);
    }

    #[test]
    fn test_sql_value_from_option() {
        assert_eq!(SqlValue::from(None::<&str>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("span1")), SqlValue::Text("span1".into()));
    }

    #[test]
    fn test_table_display() {
        let table = Table {
            columns: vec!["span_id".into(), "duration".into()],
            rows: vec![vec!["span1".into(), SqlValue::Integer(150)]],
        };
        let rendered = table.to_string();
        assert_eq!(
            rendered,
            "span_id | duration\n--------+---------\nspan1   | 150\n(1 rows)"
        );
    }
}
