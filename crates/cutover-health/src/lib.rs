//! cutover-health — health probing for blue/green deployments.
//!
//! Provides HTTP health probes with per-endpoint hysteresis and
//! pool-level health snapshots. The coordinator queries a pool snapshot
//! before every traffic shift; an endpoint only changes classification
//! after the configured number of consecutive passes or failures, which
//! keeps a flapping replica from oscillating the deployment decision.
//!
//! # Architecture
//!
//! ```text
//! PoolProber
//!   ├── Per-endpoint EndpointTracker (consecutive passes/failures)
//!   ├── http_probe() → ProbeOutcome (Pass / Fail / Error)
//!   └── probe(pool) → HealthSnapshot or ProbeError::Unavailable
//! ```
//!
//! `ProbeError::Unavailable` means the prober itself could not run, which
//! the coordinator treats differently from "the target is unhealthy".

pub mod prober;
pub mod tracker;

pub use prober::{HealthSnapshot, PoolProber, ProbeError};
pub use tracker::{EndpointHealth, EndpointTracker, ProbeOutcome};
