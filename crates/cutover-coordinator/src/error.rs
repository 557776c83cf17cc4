//! Coordinator error taxonomy.
//!
//! These are the only error kinds ever surfaced to operators: raw
//! collaborator errors are mapped into one of these before they reach a
//! deployment record or a caller.

use thiserror::Error;
use uuid::Uuid;

use cutover_state::{RouteId, StateError};

/// Result type alias for coordinator operations.
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors that can occur while driving a deployment.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("invalid canary plan: {0}")]
    InvalidPlan(String),

    /// Another deployment already owns one of the requested routes.
    #[error("route {0} is owned by another deployment")]
    RouteBusy(RouteId),

    /// Green did not reach its desired replica count in time.
    #[error("green replica set provisioning timed out: {0}")]
    ProvisionTimeout(String),

    /// Green provisioning failed outright (manager error).
    #[error("green replica set provisioning failed: {0}")]
    ProvisionFailed(String),

    /// The prober could not run; pool health is unknowable.
    #[error("health prober unavailable: {0}")]
    ProbeUnavailable(String),

    #[error("target unhealthy: {healthy} healthy, {required} required")]
    UnhealthyTarget { healthy: u32, required: u32 },

    #[error("router write failed: {0}")]
    RouterWriteFailure(String),

    #[error("blue drain failed: {0}")]
    DrainTimeout(String),

    /// Operator-initiated abort.
    #[error("deployment aborted by operator")]
    Aborted,

    /// The store is down; the coordinator must not take unpersisted
    /// actions, so the deployment stalls until the store recovers.
    #[error("state store unavailable: {0}")]
    StoreUnavailable(#[from] StateError),

    #[error("deployment not found: {0}")]
    NotFound(Uuid),
}

impl CoordinatorError {
    /// Stable kind string persisted on failed deployment records.
    pub fn kind(&self) -> &'static str {
        match self {
            CoordinatorError::InvalidPlan(_) => "invalid-plan",
            CoordinatorError::RouteBusy(_) => "route-busy",
            CoordinatorError::ProvisionTimeout(_) => "provision-timeout",
            CoordinatorError::ProvisionFailed(_) => "provision-failed",
            CoordinatorError::ProbeUnavailable(_) => "probe-unavailable",
            CoordinatorError::UnhealthyTarget { .. } => "unhealthy-target",
            CoordinatorError::RouterWriteFailure(_) => "router-write-failure",
            CoordinatorError::DrainTimeout(_) => "drain-timeout",
            CoordinatorError::Aborted => "aborted",
            CoordinatorError::StoreUnavailable(_) => "store-unavailable",
            CoordinatorError::NotFound(_) => "not-found",
        }
    }
}
