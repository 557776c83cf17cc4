//! redb table definitions for the Cutover state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Keys are UUIDs rendered with `Uuid::to_string`.

use redb::TableDefinition;

/// Deployment records keyed by deployment UUID.
pub const DEPLOYMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("deployments");

/// Replica set records keyed by replica set UUID.
pub const REPLICA_SETS: TableDefinition<&str, &[u8]> = TableDefinition::new("replica_sets");
