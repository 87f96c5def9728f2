//! ICMP ping probe executor.
//!
//! Sends a configured number of echo requests to an IPv4 endpoint and
//! reports transmitted/received counts, loss rate, and average RTT.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use surge_ping::{Client, Config, PingIdentifier, PingSequence};

use crate::config::PingSettings;
use crate::probe::PingStats;

/// Gap between echo requests outside flood mode (1 second, the classic
/// ping cadence).
const PACKET_INTERVAL: Duration = Duration::from_secs(1);

/// Echo request payload (standard 56-byte ping body).
const PAYLOAD: [u8; 56] = [0; 56];

/// ICMP ping probe executor.
#[derive(Debug, Clone)]
pub struct PingProber {
    count: u32,
    flood: bool,
    timeout: Duration,
}

impl PingProber {
    /// Create an executor from the ping section of the configuration.
    pub fn new(settings: &PingSettings) -> Self {
        Self {
            count: settings.icmp_count,
            flood: settings.flood,
            timeout: settings.timeout(),
        }
    }

    /// Run one round of echo requests against `endpoint`.
    ///
    /// Returns `None` when the probe produced no usable data: the endpoint
    /// is not an IPv4 address, or the ICMP socket could not be opened
    /// (typically missing permissions). Individual lost packets are not
    /// absence; they show up in the loss rate.
    pub async fn execute(&self, endpoint: &str) -> Option<PingStats> {
        let ip = match endpoint.parse::<Ipv4Addr>() {
            Ok(v4) => IpAddr::V4(v4),
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Not an IPv4 address, skipping ping");
                return None;
            }
        };

        let client = match Client::new(&Config::default()) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(endpoint, error = %e, "Failed to open ICMP socket");
                return None;
            }
        };

        let mut pinger = client.pinger(ip, PingIdentifier(rand::random())).await;
        pinger.timeout(self.timeout);

        let mut transmitted = 0u64;
        let mut received = 0u64;
        let mut total_rtt = Duration::ZERO;

        for seq in 0..self.count {
            transmitted += 1;
            match pinger.ping(PingSequence(seq as u16), &PAYLOAD).await {
                Ok((_, rtt)) => {
                    received += 1;
                    total_rtt += rtt;
                    tracing::debug!(endpoint, seq, rtt_ms = rtt.as_millis() as u64, "Echo reply");
                }
                Err(e) => {
                    tracing::debug!(endpoint, seq, error = %e, "Echo request failed");
                }
            }

            if !self.flood && seq + 1 < self.count {
                tokio::time::sleep(PACKET_INTERVAL).await;
            }
        }

        let loss_pct = (transmitted - received) as f64 * 100.0 / transmitted as f64;
        let rtt_avg_ms = if received > 0 {
            total_rtt.as_secs_f64() * 1000.0 / received as f64
        } else {
            0.0
        };

        Some(PingStats {
            transmitted,
            received,
            loss_pct,
            rtt_avg_ms,
            destination: endpoint.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> PingSettings {
        PingSettings {
            flood: true,
            icmp_count: 2,
            timeout: 1,
        }
    }

    #[test]
    fn test_prober_from_settings() {
        let prober = PingProber::new(&settings());
        assert_eq!(prober.count, 2);
        assert!(prober.flood);
        assert_eq!(prober.timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_execute_non_ipv4_endpoint_is_absent() {
        let prober = PingProber::new(&settings());
        assert_eq!(prober.execute("not-an-ip").await, None);
    }

    #[tokio::test]
    async fn test_execute_ipv6_endpoint_is_absent() {
        // Only IPv4 endpoints are configured for this probe kind.
        let prober = PingProber::new(&settings());
        assert_eq!(prober.execute("::1").await, None);
    }
}
