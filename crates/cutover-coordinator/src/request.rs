//! Deployment requests and queryable status.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cutover_state::{
    DeploymentOutcome, DeploymentPhase, DeploymentRecord, HealthCheckConfig, PoolId, ReplicaSpec,
    RouteId, TrafficStep,
};

use crate::error::{CoordinatorError, CoordinatorResult};

/// Everything the coordinator needs to run one blue→green migration.
///
/// The routes, pools, and the incumbent blue replica set are owned by
/// the surrounding infrastructure and referenced here by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub service_id: String,
    /// Spec for the green replica set to roll out.
    pub replica_spec: ReplicaSpec,
    /// Ordered canary steps, culminating in 100%.
    pub canary_plan: Vec<TrafficStep>,
    /// Routes shifted in lockstep; the test route shifts first.
    pub routes: Vec<RouteId>,
    pub health_check: HealthCheckConfig,
    /// Pool the blue replica set serves from.
    pub pool_blue: PoolId,
    /// Pool the green replica set registers into.
    pub pool_green: PoolId,
    /// The incumbent replica set, drained once green is promoted.
    pub blue_replica: Uuid,
}

impl DeploymentRequest {
    /// Validate the canary plan and route list before accepting the
    /// deployment.
    pub fn validate(&self) -> CoordinatorResult<()> {
        if self.canary_plan.is_empty() {
            return Err(CoordinatorError::InvalidPlan("plan is empty".to_string()));
        }
        let mut prev = 0u8;
        for (i, step) in self.canary_plan.iter().enumerate() {
            if step.percentage > 100 {
                return Err(CoordinatorError::InvalidPlan(format!(
                    "step {i} exceeds 100%: {}",
                    step.percentage
                )));
            }
            if step.percentage < prev {
                return Err(CoordinatorError::InvalidPlan(format!(
                    "step {i} decreases traffic: {} after {prev}",
                    step.percentage
                )));
            }
            prev = step.percentage;
        }
        if prev != 100 {
            return Err(CoordinatorError::InvalidPlan(format!(
                "plan must culminate in 100%, ends at {prev}"
            )));
        }
        if self.routes.is_empty() {
            return Err(CoordinatorError::InvalidPlan("no routes given".to_string()));
        }
        for (i, route) in self.routes.iter().enumerate() {
            if self.routes[..i].contains(route) {
                return Err(CoordinatorError::InvalidPlan(format!(
                    "duplicate route {route}"
                )));
            }
        }
        Ok(())
    }
}

/// Point-in-time status of a deployment, queryable by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub id: Uuid,
    pub phase: DeploymentPhase,
    /// Canary step index, for phases that carry one.
    pub step_index: Option<usize>,
    pub outcome: DeploymentOutcome,
    pub last_transition_at: u64,
    /// Precipitating error kind for failed deployments.
    pub error: Option<String>,
}

impl From<&DeploymentRecord> for DeploymentStatus {
    fn from(record: &DeploymentRecord) -> Self {
        Self {
            id: record.id,
            phase: record.phase,
            step_index: record.phase.step_index(),
            outcome: record.outcome,
            last_transition_at: record.last_transition_at,
            error: record.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn request_with_plan(plan: Vec<TrafficStep>) -> DeploymentRequest {
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
                interval_secs: 5,
                timeout_secs: 2,
                healthy_threshold: 1,
                unhealthy_threshold: 3,
            },
            pool_blue: "pool-blue".to_string(),
            pool_green: "pool-green".to_string(),
            blue_replica: Uuid::new_v4(),
        }
    }

    #[test]
    fn accepts_well_formed_plan() {
        let req = request_with_plan(vec![
            TrafficStep { percentage: 20, bake_secs: 60 },
            TrafficStep { percentage: 50, bake_secs: 60 },
            TrafficStep { percentage: 100, bake_secs: 60 },
        ]);
        req.validate().unwrap();
    }

    #[test]
    fn rejects_empty_plan() {
        let req = request_with_plan(vec![]);
        assert!(matches!(
            req.validate().unwrap_err(),
            CoordinatorError::InvalidPlan(_)
        ));
    }

    #[test]
    fn rejects_plan_not_ending_at_100() {
        let req = request_with_plan(vec![TrafficStep { percentage: 50, bake_secs: 60 }]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_decreasing_steps() {
        let req = request_with_plan(vec![
            TrafficStep { percentage: 50, bake_secs: 60 },
            TrafficStep { percentage: 20, bake_secs: 60 },
            TrafficStep { percentage: 100, bake_secs: 60 },
        ]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_routes() {
        let mut req = request_with_plan(vec![TrafficStep { percentage: 100, bake_secs: 0 }]);
        req.routes = vec![RouteId::Production, RouteId::Production];
        assert!(req.validate().is_err());
    }

    #[test]
    fn single_step_full_cutover_is_valid() {
        let req = request_with_plan(vec![TrafficStep { percentage: 100, bake_secs: 30 }]);
        req.validate().unwrap();
    }
}
