//! Netpulse - Periodic Network-Health Probe
//!
//! Concurrently measures reachability/latency of IPv4 endpoints (ICMP ping)
//! and DNS resolvers (query round trip), normalizes the raw outputs into a
//! uniform metric schema, and publishes per-destination plus aggregate
//! series to CloudWatch on a fixed cadence.
//!
//! # Architecture
//!
//! - [`probe`]: per-kind executors and raw result normalization
//! - [`dispatch`]: bounded worker-pool fan-out with barrier semantics
//! - [`metrics`]: uniform metric schema and `"ALL"` aggregation
//! - [`sink`]: CloudWatch publication boundary
//! - [`scheduler`]: the forever probe-and-publish loop
//! - [`config`]: YAML configuration, loaded once at startup

pub mod config;
pub mod dispatch;
pub mod metrics;
pub mod probe;
pub mod scheduler;
pub mod sink;

pub use config::{AppConfig, ConfigError};
pub use dispatch::{POOL_WIDTH, dispatch};
pub use metrics::{ALL_DESTINATION, MetricBatch, MetricRecord};
pub use probe::{DnsProber, Endpoint, PingProber, ProbeKind, Prober, RawProbeResult};
pub use scheduler::{Scheduler, collect_batch};
pub use sink::{CloudWatchSink, MetricSink, SinkError};
