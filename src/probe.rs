//! Probe executors and raw result normalization.
//!
//! Each probe kind owns its endpoint list, its executor, its metric
//! vocabulary, and its CloudWatch namespace. Executors never fail the
//! caller: every outcome, including permission errors and timeouts, is
//! representable in [`RawProbeResult`] so a single bad probe cannot abort
//! its siblings.

pub mod dns;
pub mod ping;

use std::time::Duration;

pub use dns::DnsProber;
pub use ping::PingProber;

use crate::metrics::{
    LATENCY, LOSS, MetricRecord, RECEIVED_COUNT, RESPONSE, RESULT, TRANSMITTED_COUNT,
};

/// Opaque probe target identifier, sourced from configuration.
pub type Endpoint = String;

/// The two probe kinds the engine schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// ICMP echo round trip.
    Ping,
    /// DNS query round trip against a nameserver.
    Dns,
}

impl ProbeKind {
    /// CloudWatch namespace the kind publishes under.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Ping => "IPV4",
            Self::Dns => "DNS",
        }
    }

    /// Failure-shaped raw result for a probe that never produced output.
    pub fn failure_raw(self) -> RawProbeResult {
        match self {
            Self::Ping => RawProbeResult::Ping(None),
            Self::Dns => RawProbeResult::Dns(DnsOutcome::Timeout),
        }
    }
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ping => write!(f, "ping"),
            Self::Dns => write!(f, "dns"),
        }
    }
}

/// Raw statistics from one round of ICMP echoes.
#[derive(Debug, Clone, PartialEq)]
pub struct PingStats {
    /// Echo requests sent.
    pub transmitted: u64,
    /// Echo replies received.
    pub received: u64,
    /// Loss percentage over the round.
    pub loss_pct: f64,
    /// Average round-trip time over received replies, in milliseconds.
    pub rtt_avg_ms: f64,
    /// Destination the round actually targeted.
    pub destination: String,
}

/// Raw outcome of one DNS query round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsOutcome {
    /// The nameserver answered.
    Resolved {
        /// Query round-trip time.
        latency: Duration,
    },
    /// No answer within the configured timeout.
    Timeout,
    /// The nameserver answered with a non-existent-domain response.
    NxDomain,
}

/// Kind-tagged raw probe output.
///
/// `Ping(None)` means the probe produced no usable data (absent), e.g. the
/// ICMP socket could not be opened.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProbeResult {
    /// ICMP round statistics, or absence.
    Ping(Option<PingStats>),
    /// DNS query outcome.
    Dns(DnsOutcome),
}

impl RawProbeResult {
    /// Probe kind that produced this result.
    pub fn kind(&self) -> ProbeKind {
        match self {
            Self::Ping(_) => ProbeKind::Ping,
            Self::Dns(_) => ProbeKind::Dns,
        }
    }

    /// Whether the probe produced no usable measurement.
    pub fn is_degraded(&self) -> bool {
        match self {
            Self::Ping(stats) => stats.is_none(),
            Self::Dns(outcome) => !matches!(outcome, DnsOutcome::Resolved { .. }),
        }
    }

    /// Convert the raw output into a uniform metric record for `endpoint`.
    ///
    /// Fractional measurements are truncated to integers. An absent ping
    /// result yields the deliberately degraded record `{result: 0}` with no
    /// other keys; a failed DNS query yields `{response: 0, latency: 0}`.
    pub fn normalize(&self, endpoint: &str) -> MetricRecord {
        match self {
            Self::Ping(Some(stats)) => MetricRecord::new(endpoint)
                .with(TRANSMITTED_COUNT, stats.transmitted as i64)
                .with(RECEIVED_COUNT, stats.received as i64)
                .with(LOSS, stats.loss_pct as i64)
                .with(LATENCY, stats.rtt_avg_ms as i64)
                .with(RESULT, 1),
            Self::Ping(None) => MetricRecord::new(endpoint).with(RESULT, 0),
            Self::Dns(DnsOutcome::Resolved { latency }) => MetricRecord::new(endpoint)
                .with(RESPONSE, 1)
                .with(LATENCY, latency.as_millis() as i64),
            Self::Dns(DnsOutcome::Timeout) | Self::Dns(DnsOutcome::NxDomain) => {
                MetricRecord::new(endpoint).with(RESPONSE, 0).with(LATENCY, 0)
            }
        }
    }
}

/// Probe executor, tagged by kind.
///
/// A tagged variant rather than a trait object: the scheduler picks the
/// executor by kind at configuration time and the set of kinds is closed.
#[derive(Debug, Clone)]
pub enum Prober {
    /// ICMP echo executor.
    Ping(PingProber),
    /// DNS query executor.
    Dns(DnsProber),
}

impl Prober {
    /// Kind of this executor.
    pub fn kind(&self) -> ProbeKind {
        match self {
            Self::Ping(_) => ProbeKind::Ping,
            Self::Dns(_) => ProbeKind::Dns,
        }
    }

    /// Run one round of measurement against `endpoint`.
    ///
    /// Blocks for the duration of the network operation, bounded by the
    /// executor's configured timeout. Never returns an error; failures are
    /// encoded in the raw result.
    pub async fn execute(&self, endpoint: &str) -> RawProbeResult {
        match self {
            Self::Ping(prober) => RawProbeResult::Ping(prober.execute(endpoint).await),
            Self::Dns(prober) => RawProbeResult::Dns(prober.execute(endpoint).await),
        }
    }
}
