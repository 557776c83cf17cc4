//! cutover-state — embedded state store for the Cutover coordinator.
//!
//! Backed by [redb](https://docs.rs/redb), provides persistent and in-memory
//! storage for deployment records and replica set records. Saving a
//! deployment record is the durability boundary of the whole system: the
//! coordinator persists every phase transition here before (or after,
//! depending on the side effect) acting on it, so a crash at any point is
//! resumable from the last saved phase.
//!
//! # Architecture
//!
//! All domain types are JSON-serialized into redb's `&[u8]` value columns,
//! keyed by the record's UUID rendered as a string.
//!
//! Saves enforce monotonic phase ordering: a write whose phase ranks behind
//! the stored record is rejected with [`StateError::StaleWrite`], which is
//! what protects a resumed coordinator from a stale second writer.
//!
//! The `StateStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::StateStore;
pub use types::*;
