//! Pool-level health probing.
//!
//! `PoolProber` probes every registered endpoint of a target pool and
//! aggregates per-endpoint classifications into a `HealthSnapshot`. One
//! `probe()` call runs at most `healthy_threshold + unhealthy_threshold`
//! probe rounds (stopping early once every endpoint has settled), each
//! round bounded by the configured timeout, so the call never blocks
//! longer than `timeout * (healthy_threshold + unhealthy_threshold)`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::debug;

use cutover_state::{Endpoint, PoolId, TargetPool};

use crate::tracker::{EndpointHealth, EndpointTracker, ProbeOutcome};

/// Aggregate health of a target pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthSnapshot {
    /// Endpoints classified healthy.
    pub healthy: u32,
    /// Endpoints classified unhealthy.
    pub unhealthy: u32,
    /// All registered endpoints (including still-unclassified ones).
    pub total: u32,
}

/// Errors from the prober itself, distinct from "the target is unhealthy".
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The prober could not execute, so pool health is unknowable.
    #[error("prober unavailable: {0}")]
    Unavailable(String),
}

/// Probes target pools over HTTP and tracks per-endpoint hysteresis
/// across calls.
pub struct PoolProber {
    /// Trackers keyed by `{pool_id}/{endpoint}`.
    trackers: Mutex<HashMap<String, EndpointTracker>>,
}

impl PoolProber {
    pub fn new() -> Self {
        Self {
            trackers: Mutex::new(HashMap::new()),
        }
    }

    /// Probe all registered endpoints of a pool and return the aggregate.
    ///
    /// Runs probe rounds until every endpoint has a definite
    /// classification or the round budget is exhausted.
    pub async fn probe(&self, pool: &TargetPool) -> Result<HealthSnapshot, ProbeError> {
        let timeout = Duration::from_secs(pool.health.timeout_secs);
        let max_rounds = (pool.health.healthy_threshold + pool.health.unhealthy_threshold).max(1);

        for round in 0..max_rounds {
            let mut tasks = JoinSet::new();
            for endpoint in &pool.endpoints {
                let endpoint = endpoint.clone();
                let path = pool.health.path.clone();
                tasks.spawn(async move {
                    let outcome = http_probe(&endpoint, &path, timeout).await;
                    (endpoint, outcome)
                });
            }

            let mut results = Vec::with_capacity(pool.endpoints.len());
            while let Some(joined) = tasks.join_next().await {
                let (endpoint, outcome) = joined
                    .map_err(|e| ProbeError::Unavailable(format!("probe task failed: {e}")))?;
                results.push((endpoint, outcome));
            }

            self.apply_round(pool, &results);
            if self.all_settled(pool) {
                debug!(pool = %pool.id, rounds = round + 1, "pool probe settled");
                break;
            }
        }

        Ok(self.snapshot(pool))
    }

    /// Record one round of probe outcomes into the trackers.
    fn apply_round(&self, pool: &TargetPool, results: &[(Endpoint, ProbeOutcome)]) {
        let mut trackers = self.trackers.lock().expect("trackers lock");
        for (endpoint, outcome) in results {
            let key = tracker_key(&pool.id, endpoint);
            trackers
                .entry(key)
                .or_insert_with(|| EndpointTracker::new(&pool.health))
                .record(*outcome);
        }
    }

    /// Aggregate current classifications for a pool's endpoints.
    ///
    /// Endpoints without a settled classification count toward `total`
    /// but toward neither `healthy` nor `unhealthy`.
    pub fn snapshot(&self, pool: &TargetPool) -> HealthSnapshot {
        let trackers = self.trackers.lock().expect("trackers lock");
        let mut healthy = 0;
        let mut unhealthy = 0;
        for endpoint in &pool.endpoints {
            match trackers
                .get(&tracker_key(&pool.id, endpoint))
                .map(|t| t.status())
            {
                Some(EndpointHealth::Healthy) => healthy += 1,
                Some(EndpointHealth::Unhealthy) => unhealthy += 1,
                Some(EndpointHealth::Unknown) | None => {}
            }
        }
        HealthSnapshot {
            healthy,
            unhealthy,
            total: pool.endpoints.len() as u32,
        }
    }

    /// Drop all tracker state for a pool (after a deployment finishes).
    pub fn reset_pool(&self, pool_id: &PoolId) {
        let prefix = format!("{pool_id}/");
        let mut trackers = self.trackers.lock().expect("trackers lock");
        trackers.retain(|key, _| !key.starts_with(&prefix));
    }

    fn all_settled(&self, pool: &TargetPool) -> bool {
        let trackers = self.trackers.lock().expect("trackers lock");
        pool.endpoints.iter().all(|endpoint| {
            trackers
                .get(&tracker_key(&pool.id, endpoint))
                .is_some_and(|t| t.is_settled())
        })
    }
}

impl Default for PoolProber {
    fn default() -> Self {
        Self::new()
    }
}

fn tracker_key(pool_id: &PoolId, endpoint: &Endpoint) -> String {
    format!("{pool_id}/{endpoint}")
}

/// Perform a single HTTP health probe against an endpoint.
///
/// Returns `Pass` for 2xx, `Fail` for non-2xx, `Error` if the connection
/// fails or the probe times out.
pub async fn http_probe(address: &str, path: &str, timeout: Duration) -> ProbeOutcome {
    let uri = format!("http://{address}{path}");

    let result = tokio::time::timeout(timeout, async {
        let stream = match tokio::net::TcpStream::connect(address).await {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, %uri, "health probe connection failed");
                return ProbeOutcome::Error;
            }
        };

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
            Ok(pair) => pair,
            Err(e) => {
                debug!(error = %e, %uri, "health probe handshake failed");
                return ProbeOutcome::Error;
            }
        };

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = match http::Request::builder()
            .method("GET")
            .uri(&uri)
            .header("host", address)
            .header("user-agent", "cutover-health/0.1")
            .body(http_body_util::Empty::<bytes::Bytes>::new())
        {
            Ok(req) => req,
            Err(e) => {
                debug!(error = %e, %uri, "health probe request build failed");
                return ProbeOutcome::Error;
            }
        };

        match sender.send_request(req).await {
            Ok(resp) => {
                if resp.status().is_success() {
                    ProbeOutcome::Pass
                } else {
                    debug!(status = %resp.status(), %uri, "health probe non-2xx");
                    ProbeOutcome::Fail
                }
            }
            Err(e) => {
                debug!(error = %e, %uri, "health probe request failed");
                ProbeOutcome::Error
            }
        }
    })
    .await;

    match result {
        Ok(outcome) => outcome,
        Err(_) => {
            debug!(%uri, "health probe timed out");
            ProbeOutcome::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutover_state::HealthCheckConfig;

    fn test_pool(endpoints: &[&str]) -> TargetPool {
        TargetPool {
            id: "pool-green".to_string(),
            health: HealthCheckConfig {
                path: "/healthz".to_string(),
                interval_secs: 1,
                timeout_secs: 1,
                healthy_threshold: 1,
                unhealthy_threshold: 1,
            },
            endpoints: endpoints.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn snapshot_counts_classifications() {
        let prober = PoolProber::new();
        let pool = test_pool(&["10.0.0.1:8080", "10.0.0.2:8080", "10.0.0.3:8080"]);

        prober.apply_round(
            &pool,
            &[
                ("10.0.0.1:8080".to_string(), ProbeOutcome::Pass),
                ("10.0.0.2:8080".to_string(), ProbeOutcome::Fail),
            ],
        );

        let snap = prober.snapshot(&pool);
        assert_eq!(snap.healthy, 1);
        assert_eq!(snap.unhealthy, 1);
        // Third endpoint never probed — counted only in total.
        assert_eq!(snap.total, 3);
    }

    #[test]
    fn snapshot_of_empty_pool_is_all_zero() {
        let prober = PoolProber::new();
        let snap = prober.snapshot(&test_pool(&[]));
        assert_eq!(
            snap,
            HealthSnapshot {
                healthy: 0,
                unhealthy: 0,
                total: 0
            }
        );
    }

    #[test]
    fn reset_pool_drops_trackers() {
        let prober = PoolProber::new();
        let pool = test_pool(&["10.0.0.1:8080"]);

        prober.apply_round(
            &pool,
            &[("10.0.0.1:8080".to_string(), ProbeOutcome::Pass)],
        );
        assert_eq!(prober.snapshot(&pool).healthy, 1);

        prober.reset_pool(&pool.id);
        assert_eq!(prober.snapshot(&pool).healthy, 0);
    }

    #[tokio::test]
    async fn probe_of_unreachable_endpoints_reports_unhealthy() {
        let prober = PoolProber::new();
        // Port 1 is not listening.
        let pool = test_pool(&["127.0.0.1:1"]);

        let snap = prober.probe(&pool).await.unwrap();
        assert_eq!(snap.healthy, 0);
        assert_eq!(snap.unhealthy, 1);
        assert_eq!(snap.total, 1);
    }

    #[tokio::test]
    async fn probe_of_empty_pool_returns_zero_snapshot() {
        let prober = PoolProber::new();
        let pool = test_pool(&[]);

        let snap = prober.probe(&pool).await.unwrap();
        assert_eq!(snap.total, 0);
    }

    #[tokio::test]
    async fn http_probe_to_closed_port_returns_error() {
        let outcome = http_probe("127.0.0.1:1", "/healthz", Duration::from_millis(100)).await;
        assert_eq!(outcome, ProbeOutcome::Error);
    }
}
