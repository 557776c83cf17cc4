//! Weighted route table with atomic writes and deployment ownership.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use cutover_state::{PoolId, RouteId};

/// Errors from route registration, weight writes, and claims.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("unknown route: {0}")]
    UnknownRoute(RouteId),

    #[error("unknown pool {pool} on route {route}")]
    UnknownPool { route: RouteId, pool: PoolId },

    #[error("weights on route {route} sum to {sum}, expected 100")]
    InvalidWeights { route: RouteId, sum: u32 },

    /// Another deployment already owns the route.
    #[error("route {route} is owned by deployment {owner}")]
    RouteBusy { route: RouteId, owner: Uuid },
}

/// Internal state for a single route.
struct RouteEntry {
    /// Pools this route may distribute to. Fixed at registration.
    pools: Vec<PoolId>,
    /// Current weight distribution (always sums to 100).
    weights: HashMap<PoolId, u8>,
    /// Advances on every effective weight change; identical writes do
    /// not advance it.
    version: u64,
    /// Deployment currently owning this route, if any.
    owner: Option<Uuid>,
}

/// Thread-safe weighted router shared between the coordinator and the
/// surrounding infrastructure.
#[derive(Clone)]
pub struct WeightedRouter {
    routes: Arc<RwLock<HashMap<RouteId, RouteEntry>>>,
}

impl WeightedRouter {
    pub fn new() -> Self {
        Self {
            routes: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a route with its pool set and initial weights.
    ///
    /// Called by the surrounding infrastructure when wiring up a service.
    /// Re-registering replaces the route entirely.
    pub fn register_route(
        &self,
        route: RouteId,
        weights: HashMap<PoolId, u8>,
    ) -> Result<(), RouterError> {
        validate_sum(route, &weights)?;
        let mut routes = self.routes.write().expect("routes lock");
        debug!(%route, pools = weights.len(), "route registered");
        routes.insert(
            route,
            RouteEntry {
                pools: weights.keys().cloned().collect(),
                weights,
                version: 0,
                owner: None,
            },
        );
        Ok(())
    }

    /// Atomically replace the weight distribution for a route.
    ///
    /// Weights must cover only registered pools and sum to 100. Setting
    /// the current distribution again is a no-op.
    pub fn set_weights(
        &self,
        route: RouteId,
        weights: HashMap<PoolId, u8>,
    ) -> Result<(), RouterError> {
        validate_sum(route, &weights)?;
        let mut routes = self.routes.write().expect("routes lock");
        let entry = routes.get_mut(&route).ok_or(RouterError::UnknownRoute(route))?;

        for pool in weights.keys() {
            if !entry.pools.contains(pool) {
                return Err(RouterError::UnknownPool {
                    route,
                    pool: pool.clone(),
                });
            }
        }

        if entry.weights == weights {
            debug!(%route, "weights unchanged, skipping write");
            return Ok(());
        }

        // Whole-map swap under the write lock: readers see either the old
        // or the new distribution, never a mix.
        entry.weights = weights;
        entry.version += 1;
        info!(%route, version = entry.version, weights = ?entry.weights, "route weights updated");
        Ok(())
    }

    /// Read the current weight distribution for a route.
    pub fn get_weights(&self, route: RouteId) -> Result<HashMap<PoolId, u8>, RouterError> {
        let routes = self.routes.read().expect("routes lock");
        routes
            .get(&route)
            .map(|e| e.weights.clone())
            .ok_or(RouterError::UnknownRoute(route))
    }

    /// The number of effective weight changes applied to a route.
    pub fn version(&self, route: RouteId) -> Result<u64, RouterError> {
        let routes = self.routes.read().expect("routes lock");
        routes
            .get(&route)
            .map(|e| e.version)
            .ok_or(RouterError::UnknownRoute(route))
    }

    /// Claim exclusive deployment-level ownership of a route.
    ///
    /// Fails fast with `RouteBusy` if another deployment owns it.
    /// Re-claiming by the current owner is a no-op.
    pub fn claim(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError> {
        let mut routes = self.routes.write().expect("routes lock");
        let entry = routes.get_mut(&route).ok_or(RouterError::UnknownRoute(route))?;
        match entry.owner {
            Some(owner) if owner != deployment => {
                Err(RouterError::RouteBusy { route, owner })
            }
            _ => {
                entry.owner = Some(deployment);
                debug!(%route, %deployment, "route claimed");
                Ok(())
            }
        }
    }

    /// Release a route claim. Only the owner's release has any effect.
    pub fn release(&self, route: RouteId, deployment: Uuid) -> Result<(), RouterError> {
        let mut routes = self.routes.write().expect("routes lock");
        let entry = routes.get_mut(&route).ok_or(RouterError::UnknownRoute(route))?;
        if entry.owner == Some(deployment) {
            entry.owner = None;
            debug!(%route, %deployment, "route released");
        }
        Ok(())
    }
}

impl Default for WeightedRouter {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_sum(route: RouteId, weights: &HashMap<PoolId, u8>) -> Result<(), RouterError> {
    let sum: u32 = weights.values().map(|w| *w as u32).sum();
    if sum != 100 {
        return Err(RouterError::InvalidWeights { route, sum });
    }
    Ok(())
}
