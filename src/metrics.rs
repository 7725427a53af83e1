//! Metrics support for the gateway.

use iroh_metrics::{Counter, MetricsGroup};

/// Metrics tracked for the preferences gateway.
#[derive(Debug, Default, MetricsGroup)]
#[metrics(name = "prefs_gateway")]
pub struct Metrics {
    /// Number of read requests.
    pub queries: Counter,
    /// Read requests that produced a row.
    pub query_rows: Counter,
    /// Read requests that resolved but produced no row.
    pub query_empty: Counter,
    /// Requests whose path did not resolve to an operation.
    pub unresolved: Counter,
    /// Malformed numeric defaults replaced by the sentinel.
    pub sentinel_defaults: Counter,
    /// Write requests, insert and update verbs combined.
    pub puts: Counter,
    /// Individual fields written by write requests.
    pub fields_written: Counter,
    /// Delete requests.
    pub deletes: Counter,
    /// Keys actually removed by delete requests.
    pub keys_removed: Counter,
    /// Batch commits issued to the backing store.
    pub commits: Counter,
}
