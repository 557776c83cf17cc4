//! cutover-router — weighted traffic routing for blue/green shifts.
//!
//! A route maps target pools to integer weights summing to 100. Weight
//! writes swap the whole distribution under one lock, so concurrent
//! readers never observe a partial distribution. Identical writes are
//! no-ops (the per-route version counter does not advance), which lets
//! the coordinator re-assert weights idempotently after a crash.
//!
//! Routes also carry an ownership claim: a deployment must claim both of
//! its routes before shifting traffic, which serializes weight changes
//! per route across concurrent deployments.

pub mod router;

pub use router::{RouterError, WeightedRouter};
