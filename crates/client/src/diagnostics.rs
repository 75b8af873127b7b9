//! Structured dispatch diagnostics
//!
//! The dispatcher reports every call through an injected [`DiagnosticsSink`]
//! rather than depending on process-wide logger configuration. Recording is
//! infallible by construction: a sink that cannot deliver an event drops it,
//! it never fails the call being observed.

use std::sync::Mutex;

use ruten_domain::constants::SECRET_PREVIEW_LEN;

/// One diagnostic record per dispatched request.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    /// Client-generated correlation id for this dispatch.
    pub correlation_id: String,
    /// HTTP method, uppercase.
    pub method: String,
    /// Signed path+query.
    pub path: String,
    /// Response status, when a response was received.
    pub status: Option<u16>,
    /// Truncated signature prefix; never the full digest.
    pub signature_preview: String,
    /// Correlation identifier reported by the upstream, when present in the
    /// response headers.
    pub upstream_request_id: Option<String>,
}

impl DispatchRecord {
    /// Truncate a signature digest for safe inclusion in diagnostics.
    pub fn preview_of(signature: &str) -> String {
        let shown: String = signature.chars().take(SECRET_PREVIEW_LEN).collect();
        format!("{shown}…")
    }
}

/// Collaborator receiving one event per dispatch.
pub trait DiagnosticsSink: Send + Sync {
    /// Record a dispatch event. Must not panic; must not block the call path
    /// beyond trivial work.
    fn record(&self, record: &DispatchRecord);
}

/// Default sink: forwards records to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn record(&self, record: &DispatchRecord) {
        tracing::info!(
            correlation_id = %record.correlation_id,
            method = %record.method,
            path = %record.path,
            status = record.status,
            signature = %record.signature_preview,
            upstream_request_id = record.upstream_request_id.as_deref(),
            "dispatched Ruten API request"
        );
    }
}

/// Sink that retains every record, for assertions in tests.
#[derive(Debug, Default)]
pub struct CapturingDiagnostics {
    records: Mutex<Vec<DispatchRecord>>,
}

impl CapturingDiagnostics {
    /// Snapshot of all records seen so far.
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.records.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl DiagnosticsSink for CapturingDiagnostics {
    fn record(&self, record: &DispatchRecord) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(record.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_preview_is_truncated() {
        let preview = DispatchRecord::preview_of(
            "4cb8b53dd5b8acc18590243b1b1ea5120617e082464d93cb74c5c5dddec542b4",
        );
        assert_eq!(preview, "4cb8b53d…");
    }

    #[test]
    fn capturing_sink_retains_records() {
        let sink = CapturingDiagnostics::default();
        sink.record(&DispatchRecord {
            correlation_id: "c-1".into(),
            method: "GET".into(),
            path: "/api/v1/product/list".into(),
            status: Some(200),
            signature_preview: "4cb8b53d…".into(),
            upstream_request_id: None,
        });

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].method, "GET");
    }
}
