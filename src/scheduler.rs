//! Scheduling loop: dispatch, normalize, aggregate, publish, sleep.
//!
//! One iteration runs the DNS cycle and then the Ping cycle, publishing one
//! batch per kind under its own namespace, then sleeps the configured
//! interval. Per-probe failures are fully recovered below this layer; only
//! sink failures surface, terminating the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::dispatch::dispatch;
use crate::metrics::MetricBatch;
use crate::probe::{DnsProber, Endpoint, PingProber, ProbeKind, Prober, RawProbeResult};
use crate::sink::{MetricSink, SinkError};

/// Run one scheduling pass for one probe kind: fan out, normalize every
/// result, and fold the batch.
///
/// Degraded probes are logged at warn level and still yield a record, so the
/// batch stays complete.
pub async fn collect_batch<F, Fut>(
    kind: ProbeKind,
    endpoints: &[Endpoint],
    probe_fn: F,
) -> MetricBatch
where
    F: Fn(Endpoint) -> Fut,
    Fut: Future<Output = RawProbeResult> + Send + 'static,
{
    let raws = dispatch(kind, endpoints, probe_fn).await;

    let mut records = Vec::with_capacity(raws.len());
    for (endpoint, raw) in &raws {
        if raw.is_degraded() {
            tracing::warn!(kind = %kind, endpoint = %endpoint, raw = ?raw,
                "Probe produced no usable data"
            );
        }
        records.push(raw.normalize(endpoint));
    }

    MetricBatch::aggregate(kind, records)
}

/// The probe-and-publish loop.
pub struct Scheduler<S> {
    interval: Duration,
    ping_endpoints: Vec<Endpoint>,
    dns_endpoints: Vec<Endpoint>,
    ping: Arc<Prober>,
    dns: Arc<Prober>,
    sink: S,
}

impl<S: MetricSink> Scheduler<S> {
    /// Build the scheduler from validated configuration.
    pub fn from_config(config: &AppConfig, sink: S) -> Self {
        Self {
            interval: config.interval(),
            ping_endpoints: config.endpoints.s3_ipv4.clone(),
            dns_endpoints: config.endpoints.dns.clone(),
            ping: Arc::new(Prober::Ping(PingProber::new(&config.ping_settings))),
            dns: Arc::new(Prober::Dns(DnsProber::new(&config.dns_settings))),
            sink,
        }
    }

    /// The sink the scheduler publishes to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Loop forever: one full iteration, then sleep the configured interval.
    ///
    /// Ends only when a publish fails; probe failures never reach here.
    pub async fn run(&self) -> Result<(), SinkError> {
        loop {
            self.run_once().await?;
            tracing::info!("transmitted");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Run one full iteration: DNS cycle, then Ping cycle.
    ///
    /// Exactly two publish calls, each under its kind's namespace.
    pub async fn run_once(&self) -> Result<(), SinkError> {
        self.run_cycle(&self.dns, &self.dns_endpoints).await?;
        self.run_cycle(&self.ping, &self.ping_endpoints).await?;
        Ok(())
    }

    async fn run_cycle(
        &self,
        prober: &Arc<Prober>,
        endpoints: &[Endpoint],
    ) -> Result<(), SinkError> {
        let kind = prober.kind();
        tracing::debug!(kind = %kind, endpoints = endpoints.len(), "Starting cycle");

        let executor = Arc::clone(prober);
        let batch = collect_batch(kind, endpoints, move |endpoint| {
            let executor = Arc::clone(&executor);
            async move { executor.execute(&endpoint).await }
        })
        .await;

        self.sink.publish(kind.namespace(), &batch).await
    }
}
