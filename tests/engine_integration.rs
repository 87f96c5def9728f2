//! Engine Integration Tests for Netpulse
//!
//! Exercises the public probe-and-aggregate pipeline end to end with mocked
//! executors and an in-memory sink; no real network traffic.

use std::sync::Mutex;
use std::time::Duration;

use netpulse::metrics::{ALL_DESTINATION, LATENCY, RESPONSE, RESULT};
use netpulse::probe::DnsOutcome;
use netpulse::{
    AppConfig, Endpoint, MetricBatch, MetricSink, ProbeKind, RawProbeResult, Scheduler, SinkError,
    collect_batch,
};

// =============================================================================
// Test Helpers
// =============================================================================

/// Sink that records every publish call instead of talking to CloudWatch.
#[derive(Default)]
struct RecordingSink {
    calls: Mutex<Vec<(String, MetricBatch)>>,
}

#[async_trait::async_trait]
impl MetricSink for RecordingSink {
    async fn publish(&self, namespace: &str, batch: &MetricBatch) -> Result<(), SinkError> {
        self.calls
            .lock()
            .unwrap()
            .push((namespace.to_string(), batch.clone()));
        Ok(())
    }
}

fn resolvers(n: usize) -> Vec<Endpoint> {
    (0..n).map(|i| format!("10.1.0.{i}")).collect()
}

/// Every third resolver times out, the rest answer with a latency derived
/// from their address.
async fn mock_dns(endpoint: Endpoint) -> RawProbeResult {
    let index: u64 = endpoint.rsplit('.').next().unwrap().parse().unwrap();
    if index % 3 == 2 {
        RawProbeResult::Dns(DnsOutcome::Timeout)
    } else {
        RawProbeResult::Dns(DnsOutcome::Resolved {
            latency: Duration::from_millis(index + 1),
        })
    }
}

// =============================================================================
// Pipeline
// =============================================================================

#[tokio::test]
async fn pass_yields_one_record_per_endpoint_plus_all() {
    let endpoints = resolvers(20);
    let batch = collect_batch(ProbeKind::Dns, &endpoints, mock_dns).await;

    assert_eq!(batch.len(), 21);

    for (record, endpoint) in batch.records.iter().zip(&endpoints) {
        assert_eq!(&record.destination, endpoint);
    }

    let all_count = batch
        .records
        .iter()
        .filter(|r| r.destination == ALL_DESTINATION)
        .count();
    assert_eq!(all_count, 1);
    assert_eq!(batch.records.last().unwrap().destination, ALL_DESTINATION);
}

#[tokio::test]
async fn pass_uses_fixed_metric_vocabulary() {
    let endpoints = resolvers(10);
    let batch = collect_batch(ProbeKind::Dns, &endpoints, mock_dns).await;

    for record in &batch.records {
        let names: Vec<&str> = record.values.keys().copied().collect();
        assert_eq!(names, vec![LATENCY, RESPONSE]);
    }
}

#[tokio::test]
async fn failed_probes_zero_out_without_aborting_the_pass() {
    let endpoints = resolvers(9);
    let batch = collect_batch(ProbeKind::Dns, &endpoints, mock_dns).await;

    // Indexes 2, 5, 8 timed out.
    for index in [2usize, 5, 8] {
        let record = &batch.records[index];
        assert_eq!(record.values.get(RESPONSE), Some(&0));
        assert_eq!(record.values.get(LATENCY), Some(&0));
    }
    // Index 8 was last, so the aggregate is the timed-out record.
    let all = batch.records.last().unwrap();
    assert_eq!(all.values.get(RESPONSE), Some(&0));
}

#[tokio::test]
async fn ping_pass_handles_total_absence() {
    let endpoints = resolvers(4);
    let batch = collect_batch(ProbeKind::Ping, &endpoints, |_| async {
        RawProbeResult::Ping(None)
    })
    .await;

    assert_eq!(batch.len(), 5);
    for record in &batch.records {
        assert_eq!(record.values.keys().copied().collect::<Vec<_>>(), vec![RESULT]);
        assert_eq!(record.values.get(RESULT), Some(&0));
    }
}

// =============================================================================
// Scheduler
// =============================================================================

const CONFIG_YAML: &str = r#"
endpoints:
  s3_ipv4: []
  dns: []
ping_settings:
  flood: false
  icmp_count: 2
dns_settings:
  hosts:
    - example.com
global_settings:
  timer: 60
"#;

#[tokio::test]
async fn iteration_publishes_dns_then_ping_under_own_namespaces() {
    let config: AppConfig = serde_yaml::from_str(CONFIG_YAML).expect("valid config");
    config.validate().expect("config validates");

    let scheduler = Scheduler::from_config(&config, RecordingSink::default());
    scheduler.run_once().await.expect("publish succeeds");

    let calls = scheduler.sink().calls.lock().unwrap();
    let namespaces: Vec<&str> = calls.iter().map(|(ns, _)| ns.as_str()).collect();
    assert_eq!(namespaces, vec!["DNS", "IPV4"]);
}
