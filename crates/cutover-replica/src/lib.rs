//! cutover-replica — replica set lifecycle against target pools.
//!
//! The manager creates versioned replica sets (blue/green), tracks their
//! registration into target pools, waits for them to become active, and
//! drains or terminates them. It never launches compute itself: the
//! surrounding infrastructure starts replicas and reports each one via
//! `register_endpoint` as it comes up.
//!
//! # Components
//!
//! - **`registry`** — In-memory target pool membership (pools are created
//!   by the surrounding infrastructure)
//! - **`manager`** — Replica set lifecycle (create, wait_active, drain,
//!   terminate) persisted through the state store

pub mod manager;
pub mod registry;

pub use manager::{ReplicaError, ReplicaResult, ReplicaSetManager};
pub use registry::PoolRegistry;
