//! Target pool registry — registration membership only.
//!
//! Pools themselves are owned by the surrounding infrastructure; the
//! coordinator side only adds and removes endpoint registrations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use cutover_state::{Endpoint, PoolId, TargetPool};

/// Shared in-memory view of target pools and their registered endpoints.
#[derive(Clone)]
pub struct PoolRegistry {
    pools: Arc<RwLock<HashMap<PoolId, TargetPool>>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add a pool (infrastructure wiring). Replaces an existing entry.
    pub fn add_pool(&self, pool: TargetPool) {
        let mut pools = self.pools.write().expect("pools lock");
        debug!(pool = %pool.id, "pool added to registry");
        pools.insert(pool.id.clone(), pool);
    }

    /// Snapshot of a pool, including its registered endpoints.
    pub fn get_pool(&self, pool_id: &PoolId) -> Option<TargetPool> {
        let pools = self.pools.read().expect("pools lock");
        pools.get(pool_id).cloned()
    }

    /// Whether a pool exists.
    pub fn contains(&self, pool_id: &PoolId) -> bool {
        let pools = self.pools.read().expect("pools lock");
        pools.contains_key(pool_id)
    }

    /// Register an endpoint into a pool. Returns false for unknown pools.
    /// Registering an already-present endpoint is a no-op.
    pub fn register(&self, pool_id: &PoolId, endpoint: &Endpoint) -> bool {
        let mut pools = self.pools.write().expect("pools lock");
        match pools.get_mut(pool_id) {
            Some(pool) => {
                if !pool.endpoints.contains(endpoint) {
                    pool.endpoints.push(endpoint.clone());
                    debug!(pool = %pool_id, %endpoint, "endpoint registered");
                }
                true
            }
            None => false,
        }
    }

    /// Deregister an endpoint from a pool. Returns false for unknown pools.
    pub fn deregister(&self, pool_id: &PoolId, endpoint: &Endpoint) -> bool {
        let mut pools = self.pools.write().expect("pools lock");
        match pools.get_mut(pool_id) {
            Some(pool) => {
                pool.endpoints.retain(|e| e != endpoint);
                debug!(pool = %pool_id, %endpoint, "endpoint deregistered");
                true
            }
            None => false,
        }
    }

    /// Currently registered endpoints of a pool.
    pub fn endpoints(&self, pool_id: &PoolId) -> Vec<Endpoint> {
        let pools = self.pools.read().expect("pools lock");
        pools
            .get(pool_id)
            .map(|p| p.endpoints.clone())
            .unwrap_or_default()
    }
}

impl Default for PoolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
