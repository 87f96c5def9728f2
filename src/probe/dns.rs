//! DNS query probe executor.
//!
//! Resolves the configured hostnames against a nameserver at the given
//! endpoint and measures query round-trip time. The first configured
//! hostname supplies the published measurement; the remaining hostnames are
//! probed and logged only.

use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;

use crate::config::DnsSettings;
use crate::probe::DnsOutcome;

/// DNS query probe executor.
#[derive(Debug, Clone)]
pub struct DnsProber {
    hosts: Vec<String>,
    timeout: Duration,
}

impl DnsProber {
    /// Create an executor from the dns section of the configuration.
    ///
    /// `settings.hosts` is validated non-empty at config load.
    pub fn new(settings: &DnsSettings) -> Self {
        Self {
            hosts: settings.hosts.clone(),
            timeout: settings.timeout(),
        }
    }

    /// Run one query round against the nameserver at `endpoint`.
    ///
    /// Timeouts and non-existent-domain responses are soft failures encoded
    /// in the outcome, never errors.
    pub async fn execute(&self, endpoint: &str) -> DnsOutcome {
        let ip = match endpoint.parse::<Ipv4Addr>() {
            Ok(v4) => IpAddr::V4(v4),
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Not an IPv4 nameserver address");
                return DnsOutcome::Timeout;
            }
        };

        let resolver = self.resolver_for(ip);

        // The primary hostname supplies the published measurement.
        let outcome = query(&resolver, endpoint, &self.hosts[0]).await;

        for host in &self.hosts[1..] {
            let secondary = query(&resolver, endpoint, host).await;
            tracing::debug!(endpoint, host = %host, outcome = ?secondary, "Secondary query");
        }

        outcome
    }

    /// Build a resolver bound to a single nameserver, no caching, no hosts
    /// file, one attempt per query.
    fn resolver_for(&self, nameserver: IpAddr) -> TokioAsyncResolver {
        let group = NameServerConfigGroup::from_ips_clear(&[nameserver], 53, true);
        let config = ResolverConfig::from_parts(None, vec![], group);

        let mut opts = ResolverOpts::default();
        opts.timeout = self.timeout;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts.use_hosts_file = false;

        TokioAsyncResolver::tokio(config, opts)
    }
}

/// Perform one lookup and classify the outcome.
async fn query(resolver: &TokioAsyncResolver, endpoint: &str, host: &str) -> DnsOutcome {
    let start = Instant::now();
    match resolver.lookup_ip(host).await {
        Ok(_) => {
            let latency = start.elapsed();
            tracing::debug!(endpoint, host, latency_ms = latency.as_millis() as u64, "Resolved");
            DnsOutcome::Resolved { latency }
        }
        Err(e) => match e.kind() {
            ResolveErrorKind::NoRecordsFound { response_code, .. } => {
                tracing::warn!(endpoint, host, %response_code, "No records found");
                DnsOutcome::NxDomain
            }
            ResolveErrorKind::Timeout => {
                tracing::warn!(endpoint, host, "DNS query timed out");
                DnsOutcome::Timeout
            }
            _ => {
                tracing::warn!(endpoint, host, error = %e, "DNS query failed");
                DnsOutcome::Timeout
            }
        },
    }
}
