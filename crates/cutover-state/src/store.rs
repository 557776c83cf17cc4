//! StateStore — redb-backed persistence for deployments and replica sets.
//!
//! Saving a deployment record is the durability boundary: the coordinator
//! saves immediately after computing a new phase and before issuing the
//! next irreversible side effect. Saves check monotonic phase ordering so
//! a stale resume cannot rewind an in-flight deployment.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;
use uuid::Uuid;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        txn.open_table(REPLICA_SETS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Deployments ────────────────────────────────────────────────

    /// Persist a deployment record.
    ///
    /// Rejects writes that regress behind the stored phase rank
    /// (`StaleWrite`), and any write against a record whose phase is
    /// already terminal.
    pub fn save_deployment(&self, record: &DeploymentRecord) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            if let Some(guard) = table.get(key.as_str()).map_err(map_err!(Read))? {
                let stored: DeploymentRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                let stale = (stored.phase.is_terminal() && record.phase != stored.phase)
                    || record.phase.rank() < stored.phase.rank();
                if stale {
                    return Err(StateError::StaleWrite {
                        id: record.id,
                        stored: stored.phase.to_string(),
                        attempted: record.phase.to_string(),
                    });
                }
            }
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(id = %record.id, phase = %record.phase, "deployment saved");
        Ok(())
    }

    /// Load a deployment by ID.
    pub fn load_deployment(&self, id: Uuid) -> StateResult<Option<DeploymentRecord>> {
        let key = id.to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: DeploymentRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all deployments whose phase is not terminal (resume set).
    pub fn list_in_flight(&self) -> StateResult<Vec<DeploymentRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: DeploymentRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if !record.phase.is_terminal() {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Delete a deployment record. Returns true if it existed.
    pub fn delete_deployment(&self, id: Uuid) -> StateResult<bool> {
        let key = id.to_string();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%id, existed, "deployment deleted");
        Ok(existed)
    }

    /// Archive terminal deployments older than the retention window.
    ///
    /// Returns the number of records removed. In-flight records are never
    /// touched.
    pub fn archive_finished(&self, now: u64, retention_secs: u64) -> StateResult<u32> {
        // Collect expired keys in a read pass first.
        let keys: Vec<String> = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            let mut expired = Vec::new();
            for entry in table.iter().map_err(map_err!(Read))? {
                let (key, value) = entry.map_err(map_err!(Read))?;
                let record: DeploymentRecord =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                if record.phase.is_terminal()
                    && now.saturating_sub(record.last_transition_at) >= retention_secs
                {
                    expired.push(key.value().to_string());
                }
            }
            expired
        };
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let count = keys.len() as u32;
        {
            let mut table = txn.open_table(DEPLOYMENTS).map_err(map_err!(Table))?;
            for key in &keys {
                table.remove(key.as_str()).map_err(map_err!(Write))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        if count > 0 {
            debug!(count, "archived finished deployments");
        }
        Ok(count)
    }

    // ── Replica sets ───────────────────────────────────────────────

    /// Insert or update a replica set record.
    pub fn put_replica_set(&self, record: &ReplicaSetRecord) -> StateResult<()> {
        let key = record.table_key();
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(REPLICA_SETS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a replica set by ID.
    pub fn get_replica_set(&self, id: Uuid) -> StateResult<Option<ReplicaSetRecord>> {
        let key = id.to_string();
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REPLICA_SETS).map_err(map_err!(Table))?;
        match table.get(key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: ReplicaSetRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List replica sets belonging to a deployment.
    pub fn list_replica_sets_for_deployment(
        &self,
        deployment_id: Uuid,
    ) -> StateResult<Vec<ReplicaSetRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(REPLICA_SETS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: ReplicaSetRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            if record.deployment_id == deployment_id {
                results.push(record);
            }
        }
        Ok(results)
    }

    /// Delete a replica set record. Returns true if it existed.
    pub fn delete_replica_set(&self, id: Uuid) -> StateResult<bool> {
        let key = id.to_string();
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(REPLICA_SETS).map_err(map_err!(Table))?;
            existed = table.remove(key.as_str()).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }
}
