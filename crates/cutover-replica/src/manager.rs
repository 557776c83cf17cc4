//! Replica set lifecycle: create, wait for activation, drain, terminate.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use cutover_state::{
    epoch_secs, Color, Endpoint, PoolId, ReplicaSetRecord, ReplicaSetState, ReplicaSpec,
    StateError, StateStore,
};

use crate::registry::PoolRegistry;

/// How often `wait_active` re-checks the registered count.
const ACTIVATION_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors from replica set operations.
#[derive(Debug, Error)]
pub enum ReplicaError {
    #[error("target pool not found: {0}")]
    PoolNotFound(PoolId),

    #[error("replica set not found: {0}")]
    ReplicaSetNotFound(Uuid),

    /// The set did not reach its desired count within the timeout.
    #[error("replica set {id} reached {registered}/{desired} replicas before timeout")]
    ProvisionTimeout {
        id: Uuid,
        registered: u32,
        desired: u32,
    },

    #[error("state store error: {0}")]
    State(#[from] StateError),
}

pub type ReplicaResult<T> = Result<T, ReplicaError>;

/// Manages versioned replica sets against target pools.
///
/// The manager does not start replicas itself; infrastructure reports
/// each replica via [`register_endpoint`](Self::register_endpoint) as it
/// comes up, and `wait_active` observes the registered count.
#[derive(Clone)]
pub struct ReplicaSetManager {
    registry: PoolRegistry,
    state: StateStore,
}

impl ReplicaSetManager {
    pub fn new(registry: PoolRegistry, state: StateStore) -> Self {
        Self { registry, state }
    }

    /// The pool registry this manager registers into.
    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    /// Create a replica set in `Provisioning` state.
    ///
    /// Returns immediately; activation is observed via `wait_active`.
    pub fn create(
        &self,
        deployment_id: Uuid,
        color: Color,
        spec: &ReplicaSpec,
        pool: &PoolId,
    ) -> ReplicaResult<ReplicaSetRecord> {
        if !self.registry.contains(pool) {
            return Err(ReplicaError::PoolNotFound(pool.clone()));
        }
        let now = epoch_secs();
        let record = ReplicaSetRecord {
            id: Uuid::new_v4(),
            deployment_id,
            color,
            spec: spec.clone(),
            pool: pool.clone(),
            endpoints: vec![],
            registered_healthy: 0,
            state: ReplicaSetState::Provisioning,
            created_at: now,
            updated_at: now,
        };
        self.state.put_replica_set(&record)?;
        info!(
            id = %record.id,
            %color,
            pool = %pool,
            desired = spec.desired_count,
            "replica set created"
        );
        Ok(record)
    }

    /// Report a replica endpoint as up (infrastructure callback).
    ///
    /// Adds the endpoint to the target pool and bumps the registered
    /// count. Ignored for terminated sets.
    pub fn register_endpoint(&self, id: Uuid, endpoint: &Endpoint) -> ReplicaResult<()> {
        let mut record = self.load(id)?;
        if record.state == ReplicaSetState::Terminated {
            warn!(%id, %endpoint, "ignoring registration for terminated replica set");
            return Ok(());
        }
        if !self.registry.register(&record.pool, endpoint) {
            return Err(ReplicaError::PoolNotFound(record.pool));
        }
        if !record.endpoints.contains(endpoint) {
            record.endpoints.push(endpoint.clone());
            record.registered_healthy = record.endpoints.len() as u32;
            record.updated_at = epoch_secs();
            self.state.put_replica_set(&record)?;
        }
        Ok(())
    }

    /// Block until the set reaches its desired count, or time out.
    ///
    /// On success the set transitions to `Active`.
    pub async fn wait_active(&self, id: Uuid, timeout: Duration) -> ReplicaResult<()> {
        let wait = async {
            loop {
                let record = self.load(id)?;
                if record.registered_healthy >= record.spec.desired_count {
                    return Ok::<ReplicaSetRecord, ReplicaError>(record);
                }
                sleep(ACTIVATION_POLL_INTERVAL).await;
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(mut record)) => {
                record.state = ReplicaSetState::Active;
                record.updated_at = epoch_secs();
                self.state.put_replica_set(&record)?;
                info!(%id, replicas = record.registered_healthy, "replica set active");
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let record = self.load(id)?;
                warn!(
                    %id,
                    registered = record.registered_healthy,
                    desired = record.spec.desired_count,
                    "replica set activation timed out"
                );
                Err(ReplicaError::ProvisionTimeout {
                    id,
                    registered: record.registered_healthy,
                    desired: record.spec.desired_count,
                })
            }
        }
    }

    /// Drain a replica set: deregister from the pool, wait the grace
    /// period for in-flight connections, then terminate.
    pub async fn drain(&self, id: Uuid, grace_period: Duration) -> ReplicaResult<()> {
        let mut record = self.load(id)?;
        if record.state == ReplicaSetState::Terminated {
            return Ok(());
        }

        for endpoint in &record.endpoints {
            self.registry.deregister(&record.pool, endpoint);
        }
        record.state = ReplicaSetState::Draining;
        record.registered_healthy = 0;
        record.updated_at = epoch_secs();
        self.state.put_replica_set(&record)?;
        info!(%id, grace_secs = grace_period.as_secs(), "replica set draining");

        sleep(grace_period).await;
        self.terminate(id)
    }

    /// Terminate a replica set. Idempotent: terminating an already
    /// terminated set succeeds silently.
    pub fn terminate(&self, id: Uuid) -> ReplicaResult<()> {
        let mut record = self.load(id)?;
        if record.state == ReplicaSetState::Terminated {
            return Ok(());
        }

        // Clear any leftover registrations (e.g. terminate without drain).
        for endpoint in &record.endpoints {
            self.registry.deregister(&record.pool, endpoint);
        }
        record.endpoints.clear();
        record.registered_healthy = 0;
        record.state = ReplicaSetState::Terminated;
        record.updated_at = epoch_secs();
        self.state.put_replica_set(&record)?;
        info!(%id, "replica set terminated");
        Ok(())
    }

    /// Load a replica set record.
    pub fn get(&self, id: Uuid) -> ReplicaResult<ReplicaSetRecord> {
        self.load(id)
    }

    fn load(&self, id: Uuid) -> ReplicaResult<ReplicaSetRecord> {
        self.state
            .get_replica_set(id)?
            .ok_or(ReplicaError::ReplicaSetNotFound(id))
    }
}
