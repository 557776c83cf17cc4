//! Domain types for the Cutover state store.
//!
//! These types represent the persisted state of an in-flight blue/green
//! deployment and the replica sets it manages. All types are serializable
//! to/from JSON for storage in redb tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Identifier of a target pool (owned by the surrounding infrastructure).
pub type PoolId = String;

/// A replica endpoint address (ip:port).
pub type Endpoint = String;

/// Current Unix timestamp in seconds.
pub fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

// ── Routes and pools ───────────────────────────────────────────────

/// The two routable endpoints a deployment shifts traffic on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteId {
    Production,
    Test,
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteId::Production => write!(f, "production"),
            RouteId::Test => write!(f, "test"),
        }
    }
}

/// Health check parameters for a target pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// HTTP path to probe (e.g., "/healthz").
    pub path: String,
    /// Check interval in seconds.
    pub interval_secs: u64,
    /// Timeout per check in seconds.
    pub timeout_secs: u64,
    /// Consecutive passes before an endpoint counts as healthy.
    pub healthy_threshold: u32,
    /// Consecutive failures before an endpoint counts as unhealthy.
    pub unhealthy_threshold: u32,
}

/// A target pool: a set of registered replica endpoints behind a route.
///
/// Pools are created by the surrounding infrastructure; the coordinator
/// only reads and writes registration membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPool {
    pub id: PoolId,
    pub health: HealthCheckConfig,
    /// Currently registered replica endpoints.
    pub endpoints: Vec<Endpoint>,
}

// ── Replica sets ──────────────────────────────────────────────────

/// Which side of the blue/green pair a replica set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Blue,
    Green,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Blue => write!(f, "blue"),
            Color::Green => write!(f, "green"),
        }
    }
}

/// Desired replica set specification (what to run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSpec {
    /// Container image reference.
    pub image: String,
    /// Environment variables injected into each replica.
    pub env: HashMap<String, String>,
    /// Port each replica listens on.
    pub port: u16,
    /// Number of replicas to run.
    pub desired_count: u32,
}

/// Lifecycle state of a replica set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicaSetState {
    Provisioning,
    Active,
    Draining,
    Terminated,
}

/// Persisted state of a versioned replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSetRecord {
    pub id: Uuid,
    /// The deployment this replica set belongs to.
    pub deployment_id: Uuid,
    pub color: Color,
    pub spec: ReplicaSpec,
    /// The target pool this set registers into.
    pub pool: PoolId,
    /// Endpoints registered so far (ip:port).
    pub endpoints: Vec<Endpoint>,
    /// Number of registered, healthy replicas.
    pub registered_healthy: u32,
    pub state: ReplicaSetState,
    pub created_at: u64,
    pub updated_at: u64,
}

// ── Deployments ───────────────────────────────────────────────────

/// One ordered step of a canary plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStep {
    /// Percentage of traffic routed to green after this step (0-100).
    pub percentage: u8,
    /// How long to bake at this percentage before validating.
    pub bake_secs: u64,
}

/// Phase of the deployment state machine.
///
/// `Succeeded` and `RolledBack` are terminal. Any phase before `Promoted`
/// may transition to `RollingBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeploymentPhase {
    Requested,
    ProvisioningGreen,
    ShiftingTraffic { step: usize },
    Baking { step: usize },
    Validating { step: usize },
    Promoted,
    DrainingBlue,
    Succeeded,
    RollingBack,
    RolledBack,
}

impl DeploymentPhase {
    /// Whether this phase ends the deployment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentPhase::Succeeded | DeploymentPhase::RolledBack)
    }

    /// The canary step index, for phases that carry one.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            DeploymentPhase::ShiftingTraffic { step }
            | DeploymentPhase::Baking { step }
            | DeploymentPhase::Validating { step } => Some(*step),
            _ => None,
        }
    }

    /// Monotonic ordering of phases, used to reject stale writes.
    ///
    /// Each canary step occupies three consecutive ranks (shift, bake,
    /// validate). Rollback phases rank above everything non-terminal so
    /// they are reachable from any in-flight phase.
    pub fn rank(&self) -> u64 {
        match self {
            DeploymentPhase::Requested => 0,
            DeploymentPhase::ProvisioningGreen => 1,
            DeploymentPhase::ShiftingTraffic { step } => 2 + 3 * (*step as u64),
            DeploymentPhase::Baking { step } => 3 + 3 * (*step as u64),
            DeploymentPhase::Validating { step } => 4 + 3 * (*step as u64),
            DeploymentPhase::Promoted => 1_000_000,
            DeploymentPhase::DrainingBlue => 1_000_001,
            DeploymentPhase::Succeeded => 1_000_002,
            DeploymentPhase::RollingBack => 2_000_000,
            DeploymentPhase::RolledBack => 2_000_001,
        }
    }
}

impl std::fmt::Display for DeploymentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentPhase::ShiftingTraffic { step } => write!(f, "shifting_traffic({step})"),
            DeploymentPhase::Baking { step } => write!(f, "baking({step})"),
            DeploymentPhase::Validating { step } => write!(f, "validating({step})"),
            other => {
                let s = match other {
                    DeploymentPhase::Requested => "requested",
                    DeploymentPhase::ProvisioningGreen => "provisioning_green",
                    DeploymentPhase::Promoted => "promoted",
                    DeploymentPhase::DrainingBlue => "draining_blue",
                    DeploymentPhase::Succeeded => "succeeded",
                    DeploymentPhase::RollingBack => "rolling_back",
                    DeploymentPhase::RolledBack => "rolled_back",
                    _ => unreachable!(),
                };
                write!(f, "{s}")
            }
        }
    }
}

/// Terminal outcome of a deployment, exposed to calling automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentOutcome {
    Pending,
    Succeeded,
    RolledBack,
    Aborted,
    FailedProvisioning,
}

impl DeploymentOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentOutcome::Pending)
    }
}

/// Durable record of an in-flight (or finished) deployment.
///
/// Mutated only by the coordinator; last-writer-wins per ID with
/// monotonic phase ordering enforced by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: Uuid,
    /// The service this deployment targets.
    pub service_id: String,
    /// Desired spec for the green replica set.
    pub spec: ReplicaSpec,
    /// Ordered canary plan, culminating in 100%.
    pub plan: Vec<TrafficStep>,
    /// Routes shifted in lockstep (production + test).
    pub routes: Vec<RouteId>,
    pub health_check: HealthCheckConfig,
    /// Pool the blue replica set serves from.
    pub pool_blue: PoolId,
    /// Pool the green replica set registers into.
    pub pool_green: PoolId,
    /// The incumbent replica set to drain on success.
    pub replica_blue: Uuid,
    /// The new replica set, once created.
    pub replica_green: Option<Uuid>,
    pub phase: DeploymentPhase,
    pub outcome: DeploymentOutcome,
    pub started_at: u64,
    pub last_transition_at: u64,
    /// Precipitating error kind for failed deployments (never a raw
    /// collaborator error).
    pub error: Option<String>,
}

impl DeploymentRecord {
    /// Key for the deployments table.
    pub fn table_key(&self) -> String {
        self.id.to_string()
    }
}

impl ReplicaSetRecord {
    /// Key for the replica sets table.
    pub fn table_key(&self) -> String {
        self.id.to_string()
    }
}
