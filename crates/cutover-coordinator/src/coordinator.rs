//! Public deployment coordinator API.
//!
//! `Coordinator` accepts deployment requests, spawns one driver task per
//! deployment, and exposes status, abort, and crash recovery. The
//! persisted deployment record is the source of truth throughout; the
//! coordinator itself holds no state a restart cannot rebuild from the
//! store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cutover_router::RouterError;
use cutover_state::{
    epoch_secs, DeploymentOutcome, DeploymentPhase, DeploymentRecord, StateStore,
};

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::request::{DeploymentRequest, DeploymentStatus};
use crate::retry::RetryPolicy;
use crate::traits::{HealthProber, ReplicaSets, TrafficRouter};

/// Tunables for the deployment drivers.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How long green may take to reach its desired replica count.
    pub provision_timeout: Duration,
    /// Grace period granted to blue's in-flight requests while draining.
    pub drain_grace: Duration,
    /// Retry policy for probe and router writes.
    pub retry: RetryPolicy,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            provision_timeout: Duration::from_secs(120),
            drain_grace: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// Shared collaborators, passed to every driver task.
pub(crate) struct Inner<P, R, M> {
    pub(crate) state: StateStore,
    pub(crate) prober: P,
    pub(crate) router: R,
    pub(crate) replicas: M,
    pub(crate) config: CoordinatorConfig,
}

struct DriverSlot {
    handle: JoinHandle<()>,
    abort_tx: watch::Sender<bool>,
}

/// Orchestrates blue/green deployments over the collaborator traits.
pub struct Coordinator<P, R, M> {
    inner: Arc<Inner<P, R, M>>,
    drivers: Arc<Mutex<HashMap<Uuid, DriverSlot>>>,
}

impl<P, R, M> Clone for Coordinator<P, R, M> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            drivers: self.drivers.clone(),
        }
    }
}

impl<P, R, M> Coordinator<P, R, M>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    pub fn new(
        state: StateStore,
        prober: P,
        router: R,
        replicas: M,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state,
                prober,
                router,
                replicas,
                config,
            }),
            drivers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accept a deployment and start driving it.
    ///
    /// Claims every requested route before anything is persisted, so two
    /// deployments can never shift the same route concurrently. On any
    /// rejection the claims are released again.
    pub async fn submit(&self, request: DeploymentRequest) -> CoordinatorResult<Uuid> {
        request.validate()?;
        let id = Uuid::new_v4();

        let mut claimed = Vec::new();
        for route in &request.routes {
            match self.inner.router.claim(*route, id).await {
                Ok(()) => claimed.push(*route),
                Err(e) => {
                    for r in claimed {
                        let _ = self.inner.router.release(r, id).await;
                    }
                    return Err(match e {
                        RouterError::RouteBusy { route, .. } => CoordinatorError::RouteBusy(route),
                        other => CoordinatorError::RouterWriteFailure(other.to_string()),
                    });
                }
            }
        }

        let now = epoch_secs();
        let record = DeploymentRecord {
            id,
            service_id: request.service_id,
            spec: request.replica_spec,
            plan: request.canary_plan,
            routes: request.routes,
            health_check: request.health_check,
            pool_blue: request.pool_blue,
            pool_green: request.pool_green,
            replica_blue: request.blue_replica,
            replica_green: None,
            phase: DeploymentPhase::Requested,
            outcome: DeploymentOutcome::Pending,
            started_at: now,
            last_transition_at: now,
            error: None,
        };
        if let Err(e) = self.inner.state.save_deployment(&record) {
            for route in &record.routes {
                let _ = self.inner.router.release(*route, id).await;
            }
            return Err(e.into());
        }

        info!(deployment = %id, service = %record.service_id, "deployment accepted");
        self.spawn_driver(id).await;
        Ok(id)
    }

    /// Current status of a deployment, straight from the store.
    pub fn status(&self, id: Uuid) -> CoordinatorResult<DeploymentStatus> {
        self.inner
            .state
            .load_deployment(id)?
            .map(|record| DeploymentStatus::from(&record))
            .ok_or(CoordinatorError::NotFound(id))
    }

    /// Request an abort. The driver rolls back at its next opportunity;
    /// deployments at or past `Promoted` are unaffected, as are finished
    /// ones.
    pub async fn abort(&self, id: Uuid) -> CoordinatorResult<()> {
        let record = self
            .inner
            .state
            .load_deployment(id)?
            .ok_or(CoordinatorError::NotFound(id))?;
        if record.phase.is_terminal() {
            return Ok(());
        }
        let drivers = self.drivers.lock().await;
        if let Some(slot) = drivers.get(&id) {
            let _ = slot.abort_tx.send(true);
            info!(deployment = %id, phase = %record.phase, "abort requested");
        } else {
            warn!(deployment = %id, "abort requested but no driver is running");
        }
        Ok(())
    }

    /// Respawn drivers for every non-terminal deployment in the store.
    ///
    /// Called once after process start. Drivers re-enter their last
    /// persisted phase; traffic weight writes are idempotent, so a shift
    /// interrupted by the crash is simply re-asserted.
    pub async fn resume(&self) -> CoordinatorResult<Vec<Uuid>> {
        let mut resumed = Vec::new();
        for record in self.inner.state.list_in_flight()? {
            {
                let drivers = self.drivers.lock().await;
                if drivers.contains_key(&record.id) {
                    continue;
                }
            }
            info!(deployment = %record.id, phase = %record.phase, "resuming deployment");
            self.spawn_driver(record.id).await;
            resumed.push(record.id);
        }
        Ok(resumed)
    }

    /// Wait for a deployment's driver task to finish. Used by shutdown
    /// sequencing and tests; the deployment's result is read via
    /// [`Coordinator::status`].
    pub async fn wait(&self, id: Uuid) {
        let slot = self.drivers.lock().await.remove(&id);
        if let Some(slot) = slot {
            let _ = slot.handle.await;
        }
    }

    /// Stop every driver task in place, without rolling anything back.
    ///
    /// In-flight deployments stay in their last persisted phase and are
    /// picked up again by [`Coordinator::resume`].
    pub async fn halt(&self) {
        let mut drivers = self.drivers.lock().await;
        for (id, slot) in drivers.drain() {
            slot.handle.abort();
            debug!(deployment = %id, "driver halted");
        }
    }

    async fn spawn_driver(&self, id: Uuid) {
        let (abort_tx, abort_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            crate::driver::drive(inner, id, abort_rx).await;
        });
        let mut drivers = self.drivers.lock().await;
        if let Some(old) = drivers.insert(id, DriverSlot { handle, abort_tx }) {
            old.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::time::Instant;

    use async_trait::async_trait;

    use cutover_health::{HealthSnapshot, ProbeError};
    use cutover_replica::ReplicaError;
    use cutover_router::WeightedRouter;
    use cutover_state::{
        Color, HealthCheckConfig, PoolId, ReplicaSetRecord, ReplicaSetState, ReplicaSpec, RouteId,
        TrafficStep,
    };

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    }

    /// Prober double: consumes a script of responses, then repeats a
    /// fallback snapshot.
    struct ScriptedProber {
        script: StdMutex<VecDeque<Result<HealthSnapshot, ProbeError>>>,
        fallback: HealthSnapshot,
    }

    impl ScriptedProber {
        fn healthy(count: u32) -> Self {
            Self {
                script: StdMutex::new(VecDeque::new()),
                fallback: HealthSnapshot {
                    healthy: count,
                    unhealthy: 0,
                    total: count,
                },
            }
        }

        fn scripted(script: Vec<Result<HealthSnapshot, ProbeError>>, fallback_healthy: u32) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                fallback: HealthSnapshot {
                    healthy: fallback_healthy,
                    unhealthy: 0,
                    total: fallback_healthy,
                },
            }
        }
    }

    #[async_trait]
    impl HealthProber for ScriptedProber {
        async fn probe(&self, _pool: &PoolId) -> Result<HealthSnapshot, ProbeError> {
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or(Ok(self.fallback))
        }
    }

    /// Replica set manager double recording every lifecycle call.
    #[derive(Default)]
    struct FakeReplicas {
        fail_provision: bool,
        fail_drain: bool,
        created: StdMutex<Vec<Uuid>>,
        drained: StdMutex<Vec<Uuid>>,
        terminated: StdMutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl ReplicaSets for Arc<FakeReplicas> {
        async fn create(
            &self,
            deployment: Uuid,
            color: Color,
            spec: &ReplicaSpec,
            pool: &PoolId,
        ) -> Result<ReplicaSetRecord, ReplicaError> {
            let record = ReplicaSetRecord {
                id: Uuid::new_v4(),
                deployment_id: deployment,
                color,
                spec: spec.clone(),
                pool: pool.clone(),
                endpoints: Vec::new(),
                registered_healthy: spec.desired_count,
                state: ReplicaSetState::Provisioning,
                created_at: 0,
                updated_at: 0,
            };
            self.created.lock().unwrap().push(record.id);
            Ok(record)
        }

        async fn wait_active(&self, id: Uuid, _timeout: Duration) -> Result<(), ReplicaError> {
            if self.fail_provision {
                Err(ReplicaError::ProvisionTimeout {
                    id,
                    registered: 0,
                    desired: 2,
                })
            } else {
                Ok(())
            }
        }

        async fn drain(&self, id: Uuid, _grace_period: Duration) -> Result<(), ReplicaError> {
            if self.fail_drain {
                return Err(ReplicaError::ReplicaSetNotFound(id));
            }
            self.drained.lock().unwrap().push(id);
            self.terminated.lock().unwrap().push(id);
            Ok(())
        }

        async fn terminate(&self, id: Uuid) -> Result<(), ReplicaError> {
            let mut terminated = self.terminated.lock().unwrap();
            if !terminated.contains(&id) {
                terminated.push(id);
            }
            Ok(())
        }
    }

    struct Harness {
        coordinator: Coordinator<ScriptedProber, WeightedRouter, Arc<FakeReplicas>>,
        store: StateStore,
        router: WeightedRouter,
        replicas: Arc<FakeReplicas>,
    }

    fn blue_weights() -> HashMap<PoolId, u8> {
        HashMap::from([
            ("pool-blue".to_string(), 100),
            ("pool-green".to_string(), 0),
        ])
    }

    fn harness(prober: ScriptedProber, replicas: FakeReplicas) -> Harness {
        init_tracing();
        let store = StateStore::open_in_memory().unwrap();
        let router = WeightedRouter::new();
        router.register_route(RouteId::Production, blue_weights()).unwrap();
        router.register_route(RouteId::Test, blue_weights()).unwrap();
        let replicas = Arc::new(replicas);
        let config = CoordinatorConfig {
            provision_timeout: Duration::from_millis(500),
            drain_grace: Duration::from_millis(5),
            retry: RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(4),
            },
        };
        let coordinator = Coordinator::new(
            store.clone(),
            prober,
            router.clone(),
            replicas.clone(),
            config,
        );
        Harness {
            coordinator,
            store,
            router,
            replicas,
        }
    }

    fn request(plan: Vec<TrafficStep>) -> DeploymentRequest {
        DeploymentRequest {
            service_id: "api".to_string(),
            replica_spec: ReplicaSpec {
                image: "registry.local/api:v2".to_string(),
                env: HashMap::new(),
                port: 8080,
                desired_count: 2,
            },
            canary_plan: plan,
            routes: vec![RouteId::Test, RouteId::Production],
            health_check: HealthCheckConfig {
                path: "/healthz".to_string(),
                interval_secs: 1,
                timeout_secs: 1,
                healthy_threshold: 2,
                unhealthy_threshold: 2,
            },
            pool_blue: "pool-blue".to_string(),
            pool_green: "pool-green".to_string(),
            blue_replica: Uuid::new_v4(),
        }
    }

    fn quick_plan() -> Vec<TrafficStep> {
        vec![
            TrafficStep { percentage: 20, bake_secs: 0 },
            TrafficStep { percentage: 100, bake_secs: 0 },
        ]
    }

    fn green_pct(weights: &HashMap<PoolId, u8>) -> u8 {
        *weights.get("pool-green").unwrap()
    }

    async fn wait_for_phase(
        store: &StateStore,
        id: Uuid,
        pred: impl Fn(DeploymentPhase) -> bool,
    ) -> DeploymentPhase {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(record) = store.load_deployment(id).unwrap() {
                if pred(record.phase) {
                    return record.phase;
                }
            }
            assert!(Instant::now() < deadline, "timed out waiting for phase");
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn healthy_deployment_succeeds_and_drains_blue() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let req = request(quick_plan());
        let blue = req.blue_replica;

        let id = h.coordinator.submit(req).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::Succeeded);
        assert_eq!(status.outcome, DeploymentOutcome::Succeeded);
        assert!(status.error.is_none());

        for route in [RouteId::Test, RouteId::Production] {
            let weights = h.router.get_weights(route).unwrap();
            assert_eq!(green_pct(&weights), 100);
            // One write per canary step; the full-green re-assert after
            // promotion matches the last step and does not bump the
            // version.
            assert_eq!(h.router.version(route).unwrap(), 2);
        }
        assert!(h.replicas.drained.lock().unwrap().contains(&blue));

        let record = h.store.load_deployment(id).unwrap().unwrap();
        let green = record.replica_green.unwrap();
        assert!(!h.replicas.terminated.lock().unwrap().contains(&green));
    }

    #[tokio::test]
    async fn unhealthy_green_rolls_back_to_blue() {
        let script = vec![Ok(HealthSnapshot {
            healthy: 1,
            unhealthy: 1,
            total: 2,
        })];
        let h = harness(ScriptedProber::scripted(script, 2), FakeReplicas::default());
        let req = request(quick_plan());
        let blue = req.blue_replica;

        let id = h.coordinator.submit(req).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::RolledBack);
        assert_eq!(status.outcome, DeploymentOutcome::RolledBack);
        assert_eq!(status.error.as_deref(), Some("unhealthy-target"));

        for route in [RouteId::Test, RouteId::Production] {
            let weights = h.router.get_weights(route).unwrap();
            assert_eq!(green_pct(&weights), 0);
        }
        let green = h.replicas.created.lock().unwrap()[0];
        assert!(h.replicas.terminated.lock().unwrap().contains(&green));
        assert!(!h.replicas.drained.lock().unwrap().contains(&blue));
    }

    #[tokio::test]
    async fn provision_timeout_fails_without_touching_traffic() {
        let replicas = FakeReplicas {
            fail_provision: true,
            ..FakeReplicas::default()
        };
        let h = harness(ScriptedProber::healthy(2), replicas);

        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::RolledBack);
        assert_eq!(status.outcome, DeploymentOutcome::FailedProvisioning);
        assert_eq!(status.error.as_deref(), Some("provision-timeout"));

        for route in [RouteId::Test, RouteId::Production] {
            assert_eq!(green_pct(&h.router.get_weights(route).unwrap()), 0);
            // Rollback re-asserts the starting distribution, which is a
            // no-op on the router.
            assert_eq!(h.router.version(route).unwrap(), 0);
        }
        let green = h.replicas.created.lock().unwrap()[0];
        assert!(h.replicas.terminated.lock().unwrap().contains(&green));
    }

    #[tokio::test]
    async fn probe_outage_exhausts_retries_then_rolls_back() {
        let script = vec![
            Err(ProbeError::Unavailable("probe pool down".to_string())),
            Err(ProbeError::Unavailable("probe pool down".to_string())),
        ];
        let h = harness(ScriptedProber::scripted(script, 2), FakeReplicas::default());

        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::RolledBack);
        assert_eq!(status.outcome, DeploymentOutcome::RolledBack);
        assert_eq!(status.error.as_deref(), Some("probe-unavailable"));
    }

    #[tokio::test]
    async fn transient_probe_outage_is_retried_through() {
        // One failure, then the fallback healthy snapshot: the retry
        // absorbs the blip and the deployment completes.
        let script = vec![Err(ProbeError::Unavailable("blip".to_string()))];
        let h = harness(ScriptedProber::scripted(script, 2), FakeReplicas::default());

        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.outcome, DeploymentOutcome::Succeeded);
    }

    #[tokio::test]
    async fn abort_during_bake_rolls_back_promptly() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let plan = vec![
            TrafficStep { percentage: 20, bake_secs: 3600 },
            TrafficStep { percentage: 100, bake_secs: 0 },
        ];

        let started = Instant::now();
        let id = h.coordinator.submit(request(plan)).await.unwrap();
        wait_for_phase(&h.store, id, |p| matches!(p, DeploymentPhase::Baking { .. })).await;

        h.coordinator.abort(id).await.unwrap();
        h.coordinator.wait(id).await;
        assert!(started.elapsed() < Duration::from_secs(5));

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::RolledBack);
        assert_eq!(status.outcome, DeploymentOutcome::Aborted);
        assert_eq!(status.error.as_deref(), Some("aborted"));

        for route in [RouteId::Test, RouteId::Production] {
            assert_eq!(green_pct(&h.router.get_weights(route).unwrap()), 0);
        }
        let green = h.replicas.created.lock().unwrap()[0];
        assert!(h.replicas.terminated.lock().unwrap().contains(&green));
    }

    #[tokio::test]
    async fn abort_after_terminal_phase_is_a_no_op() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        h.coordinator.abort(id).await.unwrap();
        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.outcome, DeploymentOutcome::Succeeded);
    }

    #[tokio::test]
    async fn concurrent_deployment_on_same_routes_is_rejected() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let plan = vec![
            TrafficStep { percentage: 20, bake_secs: 3600 },
            TrafficStep { percentage: 100, bake_secs: 0 },
        ];

        let first = h.coordinator.submit(request(plan)).await.unwrap();
        wait_for_phase(&h.store, first, |p| {
            matches!(p, DeploymentPhase::Baking { .. })
        })
        .await;

        let err = h.coordinator.submit(request(quick_plan())).await.unwrap_err();
        assert!(matches!(err, CoordinatorError::RouteBusy(_)));

        // Once the first deployment finishes, its claims are released and
        // the routes are available again.
        h.coordinator.abort(first).await.unwrap();
        h.coordinator.wait(first).await;
        let second = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(second).await;
        assert_eq!(
            h.coordinator.status(second).unwrap().outcome,
            DeploymentOutcome::Succeeded
        );
    }

    #[tokio::test]
    async fn halted_deployment_resumes_from_persisted_phase() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let plan = vec![
            TrafficStep { percentage: 20, bake_secs: 3600 },
            TrafficStep { percentage: 100, bake_secs: 0 },
        ];

        let id = h.coordinator.submit(request(plan)).await.unwrap();
        wait_for_phase(&h.store, id, |p| matches!(p, DeploymentPhase::Baking { .. })).await;
        h.coordinator.halt().await;

        // Fast-forward past the hour-long bake so the resumed driver
        // re-enters at validation instead of sleeping.
        let mut record = h.store.load_deployment(id).unwrap().unwrap();
        record.phase = DeploymentPhase::Validating { step: 0 };
        h.store.save_deployment(&record).unwrap();

        let restarted = Coordinator::new(
            h.store.clone(),
            ScriptedProber::healthy(2),
            h.router.clone(),
            h.replicas.clone(),
            CoordinatorConfig {
                provision_timeout: Duration::from_millis(500),
                drain_grace: Duration::from_millis(5),
                retry: RetryPolicy {
                    max_attempts: 2,
                    base_delay: Duration::from_millis(1),
                    max_delay: Duration::from_millis(4),
                },
            },
        );
        let resumed = restarted.resume().await.unwrap();
        assert_eq!(resumed, vec![id]);
        restarted.wait(id).await;

        let status = restarted.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::Succeeded);
        assert_eq!(status.outcome, DeploymentOutcome::Succeeded);
        for route in [RouteId::Test, RouteId::Production] {
            assert_eq!(green_pct(&h.router.get_weights(route).unwrap()), 100);
        }
    }

    #[tokio::test]
    async fn resume_with_no_in_flight_deployments_is_empty() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        assert!(h.coordinator.resume().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blue_drain_failure_still_succeeds_with_error_noted() {
        let replicas = FakeReplicas {
            fail_drain: true,
            ..FakeReplicas::default()
        };
        let h = harness(ScriptedProber::healthy(2), replicas);

        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;

        let status = h.coordinator.status(id).unwrap();
        assert_eq!(status.phase, DeploymentPhase::Succeeded);
        assert_eq!(status.outcome, DeploymentOutcome::Succeeded);
        assert_eq!(status.error.as_deref(), Some("drain-timeout"));
    }

    #[tokio::test]
    async fn invalid_plan_is_rejected_before_any_claim() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let err = h
            .coordinator
            .submit(request(vec![TrafficStep { percentage: 50, bake_secs: 0 }]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidPlan(_)));

        // Routes were never claimed; a valid deployment goes through.
        let id = h.coordinator.submit(request(quick_plan())).await.unwrap();
        h.coordinator.wait(id).await;
        assert_eq!(
            h.coordinator.status(id).unwrap().outcome,
            DeploymentOutcome::Succeeded
        );
    }

    #[tokio::test]
    async fn status_for_unknown_deployment_is_not_found() {
        let h = harness(ScriptedProber::healthy(2), FakeReplicas::default());
        let err = h.coordinator.status(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CoordinatorError::NotFound(_)));
    }
}
