//! Flatten nested Jaeger traces into span rows
//!
//! Rows come out in traversal order: traces in document order, spans in
//! trace order. Nothing is sorted or deduplicated.

use std::collections::HashMap;

use thiserror::Error;

use super::model::{RawSpan, RawTrace, RawTraceDocument};
use crate::core::constants::STATUS_CODE_TAG;
use crate::data::SpanRecord;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlattenError {
    #[error("Trace at position {position} has no traceID")]
    MissingTraceId { position: usize },

    #[error("Span at position {position} of trace {trace_id} has no spanID")]
    MissingSpanId { trace_id: String, position: usize },

    #[error("Span {span_id} of trace {trace_id} is missing {field}")]
    MissingField {
        trace_id: String,
        span_id: String,
        field: &'static str,
    },

    #[error("Span {span_id} of trace {trace_id} has negative duration {duration}")]
    NegativeDuration {
        trace_id: String,
        span_id: String,
        duration: i64,
    },
}

/// Flatten a raw document into one row per span
pub fn flatten(document: &RawTraceDocument) -> Result<Vec<SpanRecord>, FlattenError> {
    let mut rows = Vec::with_capacity(document.data.iter().map(|t| t.spans.len()).sum());
    for (position, trace) in document.data.iter().enumerate() {
        flatten_trace(trace, position, &mut rows)?;
    }
    tracing::trace!(
        traces = document.data.len(),
        rows = rows.len(),
        "Flattened trace document"
    );
    Ok(rows)
}

fn flatten_trace(
    trace: &RawTrace,
    position: usize,
    rows: &mut Vec<SpanRecord>,
) -> Result<(), FlattenError> {
    let trace_id = trace
        .trace_id
        .as_deref()
        .ok_or(FlattenError::MissingTraceId { position })?;

    let services: HashMap<&str, &str> = trace
        .processes
        .iter()
        .map(|(pid, process)| (pid.as_str(), process.service_name.as_deref().unwrap_or("")))
        .collect();

    for (span_position, span) in trace.spans.iter().enumerate() {
        rows.push(flatten_span(trace_id, span, span_position, &services)?);
    }
    Ok(())
}

fn flatten_span(
    trace_id: &str,
    span: &RawSpan,
    position: usize,
    services: &HashMap<&str, &str>,
) -> Result<SpanRecord, FlattenError> {
    let span_id = span
        .span_id
        .clone()
        .ok_or_else(|| FlattenError::MissingSpanId {
            trace_id: trace_id.to_string(),
            position,
        })?;

    let missing = |field: &'static str| FlattenError::MissingField {
        trace_id: trace_id.to_string(),
        span_id: span_id.clone(),
        field,
    };
    let operation_name = span
        .operation_name
        .clone()
        .ok_or_else(|| missing("operationName"))?;
    let start_time = span.start_time.ok_or_else(|| missing("startTime"))?;
    let duration = span.duration.ok_or_else(|| missing("duration"))?;

    if duration < 0 {
        return Err(FlattenError::NegativeDuration {
            trace_id: trace_id.to_string(),
            span_id,
            duration,
        });
    }

    let service_name = span
        .process_id
        .as_deref()
        .and_then(|pid| services.get(pid))
        .map(|s| s.to_string())
        .unwrap_or_default();

    // First matching tag wins
    let status_code = span
        .tags
        .iter()
        .find(|tag| tag.key == STATUS_CODE_TAG)
        .map(|tag| tag.value_text())
        .unwrap_or_default();

    // Only the first reference counts as the parent
    let parent_span_id = span.references.first().and_then(|r| r.span_id.clone());

    Ok(SpanRecord {
        trace_id: trace_id.to_string(),
        span_id,
        parent_span_id,
        operation_name,
        start_time,
        duration,
        status_code,
        service_name,
    })
}
