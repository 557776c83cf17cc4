//! Blue/green deployment coordinator.
//!
//! Drives a new (green) replica set from provisioning through phased
//! traffic shifts to full promotion, rolling back to the incumbent
//! (blue) set on any failure along the way. Progress is persisted after
//! every transition so a crashed coordinator resumes where it left off.

pub mod coordinator;
mod driver;
pub mod error;
pub mod request;
pub mod retry;
pub mod traits;

pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::{CoordinatorError, CoordinatorResult};
pub use request::{DeploymentRequest, DeploymentStatus};
pub use retry::RetryPolicy;
pub use traits::{HealthProber, RegistryProber, ReplicaSets, TrafficRouter};
