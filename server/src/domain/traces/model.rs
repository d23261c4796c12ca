//! Jaeger query API document types
//!
//! Only the fields the flattener reads are modelled. Everything is optional
//! on the wire; the flattener decides what is required.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response envelope of `GET /api/traces`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTraceDocument {
    /// `null` on the wire is read as an empty list
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<RawTrace>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RawApiError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawApiError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTrace {
    #[serde(rename = "traceID")]
    pub trace_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub processes: HashMap<String, RawProcess>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spans: Vec<RawSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProcess {
    #[serde(rename = "serviceName")]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    #[serde(rename = "spanID")]
    pub span_id: Option<String>,
    #[serde(rename = "operationName")]
    pub operation_name: Option<String>,
    /// Microseconds since Unix epoch
    #[serde(rename = "startTime")]
    pub start_time: Option<i64>,
    /// Microseconds
    pub duration: Option<i64>,
    #[serde(rename = "processID")]
    pub process_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<RawTag>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<RawReference>,
}

/// Span tag; Jaeger values may be strings, numbers or booleans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTag {
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl RawTag {
    /// Tag value as text: strings verbatim, `null` as empty, others as JSON
    pub fn value_text(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReference {
    #[serde(rename = "spanID")]
    pub span_id: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_null_data() {
        let doc: RawTraceDocument =
            serde_json::from_value(json!({"data": null, "total": 0})).unwrap();
        assert!(doc.data.is_empty());
        assert!(doc.errors.is_empty());
    }

    #[test]
    fn test_parse_missing_fields() {
        let doc: RawTraceDocument =
            serde_json::from_value(json!({"data": [{"traceID": "t", "spans": [{}]}]})).unwrap();
        let trace = &doc.data[0];
        assert_eq!(trace.trace_id.as_deref(), Some("t"));
        assert!(trace.processes.is_empty());
        assert_eq!(trace.spans[0], RawSpan::default());
    }

    #[test]
    fn test_parse_errors_envelope() {
        let doc: RawTraceDocument = serde_json::from_value(json!({
            "data": null,
            "errors": [{"code": 400, "msg": "parameter 'service' is required"}]
        }))
        .unwrap();
        assert_eq!(doc.errors[0].code, 400);
        assert_eq!(doc.errors[0].msg, "parameter 'service' is required");
    }

    #[test]
    fn test_tag_value_text() {
        let tag = |value| RawTag {
            key: "k".into(),
            value,
        };
        assert_eq!(tag(json!("ERROR")).value_text(), "ERROR");
        assert_eq!(tag(json!(2)).value_text(), "2");
        assert_eq!(tag(json!(true)).value_text(), "true");
        assert_eq!(tag(serde_json::Value::Null).value_text(), "");
    }
}
