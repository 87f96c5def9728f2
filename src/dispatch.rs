//! Bounded concurrent probe fan-out.
//!
//! One scheduling pass is a barrier: `dispatch` runs a probe against every
//! endpoint with at most [`POOL_WIDTH`] in flight and returns only when all
//! of them have completed or failed. Results are re-paired with their
//! originating endpoints in original list order, which is also the order the
//! `"ALL"` aggregate is folded in.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::probe::{Endpoint, ProbeKind, RawProbeResult};

/// Fixed worker-pool width shared across one dispatch call.
pub const POOL_WIDTH: usize = 8;

/// Run `probe_fn` against every endpoint, collecting all results.
///
/// Returns exactly one `(endpoint, raw result)` pair per input endpoint, in
/// input order. A probe that panics or is otherwise lost degrades to the
/// kind's failure-shaped raw result; nothing aborts the batch.
pub async fn dispatch<F, Fut>(
    kind: ProbeKind,
    endpoints: &[Endpoint],
    probe_fn: F,
) -> Vec<(Endpoint, RawProbeResult)>
where
    F: Fn(Endpoint) -> Fut,
    Fut: Future<Output = RawProbeResult> + Send + 'static,
{
    let pool = Arc::new(Semaphore::new(POOL_WIDTH));
    let mut tasks = JoinSet::new();

    for (index, endpoint) in endpoints.iter().enumerate() {
        let pool = Arc::clone(&pool);
        let probe = probe_fn(endpoint.clone());
        tasks.spawn(async move {
            // The semaphore is never closed, so acquire cannot fail; the
            // permit is held for the probe's whole lifetime.
            let _permit = pool.acquire_owned().await.ok();
            (index, probe.await)
        });
    }

    let mut slots: Vec<Option<RawProbeResult>> = vec![None; endpoints.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, raw)) => slots[index] = Some(raw),
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Probe task lost, recording failure");
            }
        }
    }

    endpoints
        .iter()
        .cloned()
        .zip(slots)
        .map(|(endpoint, slot)| (endpoint, slot.unwrap_or_else(|| kind.failure_raw())))
        .collect()
}
