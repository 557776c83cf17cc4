//! The per-deployment driver loop.
//!
//! Each accepted deployment gets one driver task that walks the record
//! through the phase machine. The loop reloads the record from the
//! store at every iteration, performs the current phase's action, and
//! persists the next phase. Ordering rules:
//!
//! - Before an irreversible side effect (traffic shift, terminate), the
//!   phase that implies the effect is already persisted, so a crash
//!   leaves at most one unconfirmed shift. Weight writes are idempotent,
//!   so resume simply re-asserts them.
//! - Health queries persist their consequence *after* the query; the
//!   query itself is the source of truth and can be repeated.
//!
//! Any error before `Promoted` funnels into `RollingBack`. Errors after
//! promotion (weight re-assert, blue drain) are reported on the record
//! but never fail the deployment — green is already fully live. Store
//! errors stall the driver entirely: no unpersisted action is ever
//! taken, and `resume` picks the deployment back up once the store
//! returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use cutover_replica::ReplicaError;
use cutover_state::{
    epoch_secs, Color, DeploymentOutcome, DeploymentPhase, DeploymentRecord, PoolId, RouteId,
};

use crate::coordinator::Inner;
use crate::error::CoordinatorError;
use crate::retry::with_retry;
use crate::traits::{HealthProber, ReplicaSets, TrafficRouter};

/// Entry point for a driver task.
pub(crate) async fn drive<P, R, M>(
    inner: Arc<Inner<P, R, M>>,
    id: Uuid,
    mut abort_rx: watch::Receiver<bool>,
) where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    if let Err(e) = run(&inner, id, &mut abort_rx).await {
        // Store failures land here: the deployment stalls in its last
        // persisted phase and is picked up again by `resume`.
        error!(deployment = %id, error = %e, "deployment driver stalled");
    }
}

async fn run<P, R, M>(
    inner: &Inner<P, R, M>,
    id: Uuid,
    abort_rx: &mut watch::Receiver<bool>,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    loop {
        let mut rec = inner
            .state
            .load_deployment(id)?
            .ok_or(CoordinatorError::NotFound(id))?;

        // Operator abort pre-empts any phase before promotion. From
        // `Promoted` on, green is fully live and rollback would shift
        // traffic onto a set that is about to drain.
        if *abort_rx.borrow() && rec.phase.rank() < DeploymentPhase::Promoted.rank() {
            enter_rollback(inner, &mut rec, &CoordinatorError::Aborted).await?;
            continue;
        }

        match rec.phase {
            DeploymentPhase::Requested => {
                transition(inner, &mut rec, DeploymentPhase::ProvisioningGreen).await?;
            }

            DeploymentPhase::ProvisioningGreen => {
                match provision_green(inner, &mut rec).await {
                    Ok(()) => {
                        transition(inner, &mut rec, DeploymentPhase::ShiftingTraffic { step: 0 })
                            .await?;
                    }
                    Err(e @ CoordinatorError::StoreUnavailable(_)) => return Err(e),
                    Err(e) => enter_rollback(inner, &mut rec, &e).await?,
                }
            }

            DeploymentPhase::ShiftingTraffic { step } => {
                let Some(planned) = rec.plan.get(step).copied() else {
                    let e = CoordinatorError::InvalidPlan(format!("no step {step} in plan"));
                    enter_rollback(inner, &mut rec, &e).await?;
                    continue;
                };
                match apply_weights(inner, &rec, planned.percentage).await {
                    Ok(()) => {
                        transition(inner, &mut rec, DeploymentPhase::Baking { step }).await?;
                    }
                    Err(e) => enter_rollback(inner, &mut rec, &e).await?,
                }
            }

            DeploymentPhase::Baking { step } => {
                let bake_secs = rec.plan.get(step).map(|s| s.bake_secs).unwrap_or(0);
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(bake_secs)) => {
                        transition(inner, &mut rec, DeploymentPhase::Validating { step }).await?;
                    }
                    changed = abort_rx.changed() => {
                        // An abort is handled at the top of the loop. A
                        // closed channel means no abort can arrive; finish
                        // the bake instead of spinning on the receiver.
                        if changed.is_err() {
                            tokio::time::sleep(Duration::from_secs(bake_secs)).await;
                            transition(inner, &mut rec, DeploymentPhase::Validating { step })
                                .await?;
                        }
                    }
                }
            }

            DeploymentPhase::Validating { step } => {
                match validate_health(inner, &rec).await {
                    Ok(()) => {
                        let next = if step + 1 >= rec.plan.len() {
                            DeploymentPhase::Promoted
                        } else {
                            DeploymentPhase::ShiftingTraffic { step: step + 1 }
                        };
                        transition(inner, &mut rec, next).await?;
                    }
                    Err(e) => enter_rollback(inner, &mut rec, &e).await?,
                }
            }

            DeploymentPhase::Promoted => {
                // Idempotent re-assert of full green. Green is live, so a
                // failure here is cleanup noise, not a rollback trigger.
                if let Err(e) = apply_weights(inner, &rec, 100).await {
                    warn!(deployment = %id, error = %e, "full-green re-assert failed");
                }
                transition(inner, &mut rec, DeploymentPhase::DrainingBlue).await?;
            }

            DeploymentPhase::DrainingBlue => {
                if let Err(e) = drain_blue(inner, &rec).await {
                    warn!(
                        deployment = %id,
                        error = %e,
                        "blue drain failed; deployment succeeds regardless"
                    );
                    rec.error = Some(e.kind().to_string());
                }
                rec.outcome = DeploymentOutcome::Succeeded;
                transition(inner, &mut rec, DeploymentPhase::Succeeded).await?;
                release_routes(inner, &rec).await;
                info!(deployment = %id, "deployment succeeded");
                return Ok(());
            }

            DeploymentPhase::RollingBack => {
                run_rollback(inner, &rec).await;
                rec.outcome = rollback_outcome(rec.error.as_deref());
                transition(inner, &mut rec, DeploymentPhase::RolledBack).await?;
                release_routes(inner, &rec).await;
                info!(deployment = %id, outcome = ?rec.outcome, "deployment rolled back");
                return Ok(());
            }

            DeploymentPhase::Succeeded | DeploymentPhase::RolledBack => return Ok(()),
        }
    }
}

/// Persist a phase transition.
async fn transition<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &mut DeploymentRecord,
    next: DeploymentPhase,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    let from = rec.phase;
    rec.phase = next;
    rec.last_transition_at = epoch_secs();
    inner.state.save_deployment(rec)?;
    info!(deployment = %rec.id, %from, to = %next, "phase transition");
    Ok(())
}

/// Record the precipitating error and move into `RollingBack`.
async fn enter_rollback<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &mut DeploymentRecord,
    cause: &CoordinatorError,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    warn!(deployment = %rec.id, phase = %rec.phase, error = %cause, "rolling back");
    rec.error = Some(cause.kind().to_string());
    transition(inner, rec, DeploymentPhase::RollingBack).await
}

/// Create green (once) and wait for it to reach its desired count.
async fn provision_green<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &mut DeploymentRecord,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    if rec.replica_green.is_none() {
        let created = inner
            .replicas
            .create(rec.id, Color::Green, &rec.spec, &rec.pool_green)
            .await
            .map_err(map_provision_error)?;
        rec.replica_green = Some(created.id);
        // Same-phase save so a crash after creation does not leak an
        // untracked green replica set.
        inner.state.save_deployment(rec)?;
    }
    let green = rec
        .replica_green
        .ok_or_else(|| CoordinatorError::ProvisionFailed("green id missing".to_string()))?;

    inner
        .replicas
        .wait_active(green, inner.config.provision_timeout)
        .await
        .map_err(map_provision_error)
}

fn map_provision_error(e: ReplicaError) -> CoordinatorError {
    match e {
        ReplicaError::ProvisionTimeout { .. } => CoordinatorError::ProvisionTimeout(e.to_string()),
        ReplicaError::State(se) => CoordinatorError::StoreUnavailable(se),
        other => CoordinatorError::ProvisionFailed(other.to_string()),
    }
}

/// Set `pct`% of traffic to green (the rest to blue) on every route.
///
/// The test route shifts first so pre-production validation sees each
/// canary increment before production does. Writes retry with backoff
/// before escalating as `RouterWriteFailure`.
async fn apply_weights<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &DeploymentRecord,
    pct: u8,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    let mut weights: HashMap<PoolId, u8> = HashMap::new();
    weights.insert(rec.pool_green.clone(), pct);
    weights.insert(rec.pool_blue.clone(), 100 - pct);

    for route in ordered_routes(&rec.routes) {
        let w = weights.clone();
        with_retry(&inner.config.retry, "set_weights", || {
            let w = w.clone();
            async move { inner.router.set_weights(route, w).await }
        })
        .await
        .map_err(|e| CoordinatorError::RouterWriteFailure(e.to_string()))?;
        info!(deployment = %rec.id, %route, green_pct = pct, "route weights applied");
    }
    Ok(())
}

/// Routes in shift order: test before production.
fn ordered_routes(routes: &[RouteId]) -> Vec<RouteId> {
    let mut ordered = routes.to_vec();
    ordered.sort_by_key(|r| match r {
        RouteId::Test => 0,
        RouteId::Production => 1,
    });
    ordered
}

/// Probe green's pool and compare against the healthy threshold.
async fn validate_health<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &DeploymentRecord,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    let snapshot = with_retry(&inner.config.retry, "probe", || async {
        inner.prober.probe(&rec.pool_green).await
    })
    .await
    .map_err(|e| CoordinatorError::ProbeUnavailable(e.to_string()))?;

    let required = rec.health_check.healthy_threshold;
    info!(
        deployment = %rec.id,
        healthy = snapshot.healthy,
        unhealthy = snapshot.unhealthy,
        total = snapshot.total,
        required,
        "green pool health"
    );
    if snapshot.healthy < required {
        return Err(CoordinatorError::UnhealthyTarget {
            healthy: snapshot.healthy,
            required,
        });
    }
    Ok(())
}

async fn drain_blue<P, R, M>(
    inner: &Inner<P, R, M>,
    rec: &DeploymentRecord,
) -> Result<(), CoordinatorError>
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    inner
        .replicas
        .drain(rec.replica_blue, inner.config.drain_grace)
        .await
        .map_err(|e| CoordinatorError::DrainTimeout(e.to_string()))
}

/// Best-effort rollback side effects: all traffic back to blue, then
/// terminate green. Failures are logged; the record still reaches
/// `RolledBack` so the operator sees a consistent terminal state.
async fn run_rollback<P, R, M>(inner: &Inner<P, R, M>, rec: &DeploymentRecord)
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    if let Err(e) = apply_weights(inner, rec, 0).await {
        error!(deployment = %rec.id, error = %e, "failed to reset routes to blue");
    }
    if let Some(green) = rec.replica_green {
        if let Err(e) = inner.replicas.terminate(green).await {
            error!(deployment = %rec.id, error = %e, "failed to terminate green");
        }
    }
}

async fn release_routes<P, R, M>(inner: &Inner<P, R, M>, rec: &DeploymentRecord)
where
    P: HealthProber,
    R: TrafficRouter,
    M: ReplicaSets,
{
    for route in &rec.routes {
        if let Err(e) = inner.router.release(*route, rec.id).await {
            warn!(deployment = %rec.id, %route, error = %e, "route release failed");
        }
    }
}

/// Map the persisted error kind to the terminal outcome exposed to
/// calling automation.
fn rollback_outcome(error_kind: Option<&str>) -> DeploymentOutcome {
    match error_kind {
        Some("aborted") => DeploymentOutcome::Aborted,
        Some("provision-timeout") | Some("provision-failed") => {
            DeploymentOutcome::FailedProvisioning
        }
        _ => DeploymentOutcome::RolledBack,
    }
}
