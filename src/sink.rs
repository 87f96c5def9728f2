//! Metric publication boundary.
//!
//! The engine hands each [`MetricBatch`] to a [`MetricSink`]. The production
//! sink publishes to CloudWatch with one `PutMetricData` call per batch and
//! no retry: delivery is at most once per cycle.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatch::error::{BuildError, SdkError};
use aws_sdk_cloudwatch::operation::put_metric_data::PutMetricDataError;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum};
use thiserror::Error;

use crate::metrics::{ALL_DESTINATION, MetricBatch};

/// CloudWatch region metrics are published to.
const REGION: &str = "us-east-1";

/// Errors that can occur while publishing a batch.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A metric datum could not be assembled.
    #[error("failed to build metric datum: {0}")]
    Build(#[from] BuildError),

    /// The metrics backend rejected the publish call.
    #[error("failed to publish metrics: {0}")]
    Publish(#[from] SdkError<PutMetricDataError>),
}

/// Publishes a batch of tagged metric records to the monitoring backend.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Publish one batch under a probe-kind-specific namespace.
    async fn publish(&self, namespace: &str, batch: &MetricBatch) -> Result<(), SinkError>;
}

/// CloudWatch metric sink.
///
/// Each record value becomes one datum tagged with a `destination` dimension
/// and a `Source` dimension carrying the local hostname, or `"ALL"` for the
/// aggregate record.
pub struct CloudWatchSink {
    client: aws_sdk_cloudwatch::Client,
    source: String,
}

impl CloudWatchSink {
    /// Create a sink backed by the default AWS credential chain.
    pub async fn new() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(REGION))
            .load()
            .await;

        Self {
            client: aws_sdk_cloudwatch::Client::new(&config),
            source: local_hostname(),
        }
    }
}

impl std::fmt::Debug for CloudWatchSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudWatchSink")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetricSink for CloudWatchSink {
    async fn publish(&self, namespace: &str, batch: &MetricBatch) -> Result<(), SinkError> {
        if batch.is_empty() {
            tracing::debug!(namespace, "Empty batch, nothing to publish");
            return Ok(());
        }

        let data = batch_to_data(batch, &self.source)?;
        let datum_count = data.len();

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(data))
            .send()
            .await?;

        tracing::debug!(namespace, datum_count, "Batch published");
        Ok(())
    }
}

/// Lowercased local hostname for the `Source` dimension.
fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_lowercase())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read local hostname");
            "unknown".to_string()
        })
}

/// Flatten a batch into CloudWatch metric data.
fn batch_to_data(batch: &MetricBatch, source: &str) -> Result<Vec<MetricDatum>, SinkError> {
    let mut data = Vec::new();

    for record in &batch.records {
        let source = if record.destination == ALL_DESTINATION {
            ALL_DESTINATION
        } else {
            source
        };

        for (name, value) in &record.values {
            let datum = MetricDatum::builder()
                .metric_name(*name)
                .value(*value as f64)
                .dimensions(
                    Dimension::builder()
                        .name("destination")
                        .value(record.destination.as_str())
                        .build(),
                )
                .dimensions(Dimension::builder().name("Source").value(source).build())
                .build();
            data.push(datum);
        }
    }

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{LATENCY, MetricRecord, RESPONSE};
    use crate::probe::ProbeKind;

    fn sample_batch() -> MetricBatch {
        MetricBatch::aggregate(
            ProbeKind::Dns,
            vec![
                MetricRecord::new("8.8.8.8").with(RESPONSE, 1).with(LATENCY, 12),
                MetricRecord::new("9.9.9.9").with(RESPONSE, 0).with(LATENCY, 0),
            ],
        )
    }

    fn dimension_value<'a>(datum: &'a MetricDatum, name: &str) -> &'a str {
        datum
            .dimensions()
            .iter()
            .find(|d| d.name() == Some(name))
            .and_then(|d| d.value())
            .unwrap()
    }

    #[test]
    fn test_batch_to_data_one_datum_per_value() {
        let data = batch_to_data(&sample_batch(), "probe-host").unwrap();
        // 3 records (two endpoints + ALL), two values each.
        assert_eq!(data.len(), 6);
    }

    #[test]
    fn test_batch_to_data_dimensions() {
        let data = batch_to_data(&sample_batch(), "probe-host").unwrap();

        let first = &data[0];
        assert_eq!(dimension_value(first, "destination"), "8.8.8.8");
        assert_eq!(dimension_value(first, "Source"), "probe-host");

        let all = data.last().unwrap();
        assert_eq!(dimension_value(all, "destination"), ALL_DESTINATION);
        assert_eq!(dimension_value(all, "Source"), ALL_DESTINATION);
    }

    #[test]
    fn test_batch_to_data_values() {
        let data = batch_to_data(&sample_batch(), "probe-host").unwrap();

        let latency = data
            .iter()
            .find(|d| {
                d.metric_name() == Some(LATENCY)
                    && dimension_value(d, "destination") == "8.8.8.8"
            })
            .unwrap();
        assert_eq!(latency.value(), Some(12.0));
    }
}
