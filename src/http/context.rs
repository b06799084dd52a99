//! Per-request logging context.

use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "X-Trace-ID";

/// Trace and span ids attached to every log line of one request.
///
/// The trace id comes from the `X-Trace-ID` header when the caller sends one;
/// the span id is always fresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub trace_id: String,
    pub span_id: String,
}

impl RequestContext {
    pub fn new(trace_id: Option<&str>) -> Self {
        let trace_id = match trace_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };
        Self {
            trace_id,
            span_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn info(&self, message: &str, data: &str) {
        log::info!(
            "trace_id={} span_id={} {}: {}",
            self.trace_id,
            self.span_id,
            message,
            data
        );
    }

    pub fn error(&self, message: &str, err: &dyn std::fmt::Display) {
        log::error!(
            "trace_id={} span_id={} {}: {}",
            self.trace_id,
            self.span_id,
            message,
            err
        );
    }
}
