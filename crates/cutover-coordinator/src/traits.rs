//! Collaborator contracts the coordinator drives deployments through.
//!
//! The coordinator never mutates routes, pools, or replica sets
//! directly; every side effect goes through one of these traits, which
//! keeps routing and replica changes paired with persisted state
//! transitions. The concrete implementations live in the sibling crates
//! and are adapted here; tests substitute scripted doubles.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use cutover_health::{HealthSnapshot, PoolProber, ProbeError};
use cutover_replica::{PoolRegistry, ReplicaError, ReplicaSetManager};
use cutover_router::{RouterError, WeightedRouter};
use cutover_state::{Color, PoolId, ReplicaSetRecord, ReplicaSpec, RouteId};

/// Reports aggregate health of a target pool.
#[async_trait]
pub trait HealthProber: Send + Sync + 'static {
    /// Probe a pool. `Err(Unavailable)` means "I cannot tell", which the
    /// coordinator treats differently from "the target is unhealthy".
    async fn probe(&self, pool: &PoolId) -> Result<HealthSnapshot, ProbeError>;
}

/// Sets and reads weighted traffic distributions per route.
#[async_trait]
pub trait TrafficRouter: Send + Sync + 'static {
    async fn set_weights(
        &self,
        route: RouteId,
        weights: HashMap<PoolId, u8>,
    ) -> Result<(), RouterError>;

    async fn get_weights(&self, route: RouteId) -> Result<HashMap<PoolId, u8>, RouterError>;

    /// Take exclusive deployment-level ownership of a route.
    async fn claim(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError>;

    async fn release(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError>;
}

/// Creates, activates, drains, and terminates replica sets.
#[async_trait]
pub trait ReplicaSets: Send + Sync + 'static {
    async fn create(
        &self,
        deployment: Uuid,
        color: Color,
        spec: &ReplicaSpec,
        pool: &PoolId,
    ) -> Result<ReplicaSetRecord, ReplicaError>;

    async fn wait_active(&self, id: Uuid, timeout: Duration) -> Result<(), ReplicaError>;

    async fn drain(&self, id: Uuid, grace_period: Duration) -> Result<(), ReplicaError>;

    async fn terminate(&self, id: Uuid) -> Result<(), ReplicaError>;
}

// ── Concrete adapters ─────────────────────────────────────────────

/// HTTP prober bound to a pool registry, so pools can be probed by ID.
pub struct RegistryProber {
    registry: PoolRegistry,
    prober: PoolProber,
}

impl RegistryProber {
    pub fn new(registry: PoolRegistry) -> Self {
        Self {
            registry,
            prober: PoolProber::new(),
        }
    }
}

#[async_trait]
impl HealthProber for RegistryProber {
    async fn probe(&self, pool: &PoolId) -> Result<HealthSnapshot, ProbeError> {
        // A missing pool is a prober-side failure: health is unknowable,
        // not "unhealthy".
        let pool = self
            .registry
            .get_pool(pool)
            .ok_or_else(|| ProbeError::Unavailable(format!("pool {pool} not in registry")))?;
        self.prober.probe(&pool).await
    }
}

#[async_trait]
impl TrafficRouter for WeightedRouter {
    async fn set_weights(
        &self,
        route: RouteId,
        weights: HashMap<PoolId, u8>,
    ) -> Result<(), RouterError> {
        WeightedRouter::set_weights(self, route, weights)
    }

    async fn get_weights(&self, route: RouteId) -> Result<HashMap<PoolId, u8>, RouterError> {
        WeightedRouter::get_weights(self, route)
    }

    async fn claim(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError> {
        WeightedRouter::claim(self, route, deployment)
    }

    async fn release(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError> {
        WeightedRouter::release(self, route, deployment)
    }
}

#[async_trait]
impl ReplicaSets for ReplicaSetManager {
    async fn create(
        &self,
        deployment: Uuid,
        color: Color,
        spec: &ReplicaSpec,
        pool: &PoolId,
    ) -> Result<ReplicaSetRecord, ReplicaError> {
        ReplicaSetManager::create(self, deployment, color, spec, pool)
    }

    async fn wait_active(&self, id: Uuid, timeout: Duration) -> Result<(), ReplicaError> {
        ReplicaSetManager::wait_active(self, id, timeout).await
    }

    async fn drain(&self, id: Uuid, grace_period: Duration) -> Result<(), ReplicaError> {
        ReplicaSetManager::drain(self, id, grace_period).await
    }

    async fn terminate(&self, id: Uuid) -> Result<(), ReplicaError> {
        ReplicaSetManager::terminate(self, id)
    }
}
