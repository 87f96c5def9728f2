//! Uniform metric schema and batch aggregation.
//!
//! Raw probe outputs are normalized into [`MetricRecord`]s drawn from a
//! fixed, kind-specific name vocabulary, then folded into a [`MetricBatch`]
//! that carries one record per destination plus a single synthetic `"ALL"`
//! record for the whole pass.

use std::collections::BTreeMap;

use crate::probe::ProbeKind;

/// Destination key of the synthetic aggregate record.
pub const ALL_DESTINATION: &str = "ALL";

/// Echo requests sent (ping vocabulary).
pub const TRANSMITTED_COUNT: &str = "transmitted_count";

/// Echo replies received (ping vocabulary).
pub const RECEIVED_COUNT: &str = "received_count";

/// Packet loss percentage (ping vocabulary).
pub const LOSS: &str = "loss";

/// Round-trip time in milliseconds (shared vocabulary).
pub const LATENCY: &str = "latency";

/// Probe produced usable data: 1 or 0 (ping vocabulary).
pub const RESULT: &str = "result";

/// Query answered: 1 or 0 (dns vocabulary).
pub const RESPONSE: &str = "response";

/// Normalized measurement for exactly one destination.
///
/// Values are integers; fractional measurements are truncated during
/// normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRecord {
    /// Literal endpoint, or [`ALL_DESTINATION`] for the aggregate record.
    pub destination: String,

    /// Metric name to value, in name order.
    pub values: BTreeMap<&'static str, i64>,
}

impl MetricRecord {
    /// Create an empty record for a destination.
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a metric value, replacing any previous value under that name.
    #[must_use]
    pub fn with(mut self, name: &'static str, value: i64) -> Self {
        self.values.insert(name, value);
        self
    }
}

/// Ordered records produced within one scheduling pass for one probe kind.
///
/// This is the unit handed to the metric sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricBatch {
    /// Probe kind that produced the batch.
    pub kind: ProbeKind,

    /// Per-destination records followed by the `"ALL"` record.
    pub records: Vec<MetricRecord>,
}

impl MetricBatch {
    /// Fold per-endpoint records into a batch with one `"ALL"` record.
    ///
    /// The merge policy is last-write-wins: each record overwrites the
    /// `"ALL"` values wholesale, so the published aggregate equals the last
    /// record in input order. It is not a sum or average; downstream alarms
    /// depend on this exact shape, and tests pin it.
    ///
    /// An empty input yields an empty batch with no `"ALL"` record.
    pub fn aggregate(kind: ProbeKind, mut records: Vec<MetricRecord>) -> Self {
        let all = records.last().map(|last| MetricRecord {
            destination: ALL_DESTINATION.to_string(),
            values: last.values.clone(),
        });
        records.extend(all);

        Self { kind, records }
    }

    /// Number of records in the batch, including `"ALL"`.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch carries no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
