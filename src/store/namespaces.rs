use std::path::Path;

use anyhow::{Context, Result};
use redb::{backends::InMemoryBackend, Database, ReadableTable, TableDefinition};
use tracing::info;

use crate::value::Value;

const PREFS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("prefs-1");

/// A single preference namespace, backed by its own redb database.
///
/// Values are stored postcard-encoded, so the tag of a [`Value`] round-trips
/// with its payload. Every write transaction is one committed batch.
#[derive(Debug)]
pub struct NamespaceDb {
    db: Database,
}

impl NamespaceDb {
    pub fn persistent(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("loading namespace database from {}", path.to_string_lossy());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!(
                    "failed to create database directory at {}",
                    path.to_string_lossy()
                )
            })?;
        }
        let db = Database::builder()
            .create(path)
            .context("failed to open namespace database")?;
        Self::open(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::open(db)
    }

    fn open(db: Database) -> Result<Self> {
        let write_tx = db.begin_write()?;
        {
            let _table = write_tx.open_table(PREFS_TABLE)?;
        }
        write_tx.commit()?;
        Ok(Self { db })
    }

    /// Read the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(PREFS_TABLE)?;
        let Some(row) = table.get(key)? else {
            return Ok(None);
        };
        let value = postcard::from_bytes(row.value()).context("failed to decode stored value")?;
        Ok(Some(value))
    }

    /// Write a batch of fields and commit them as a unit.
    pub fn put_batch(&self, entries: &[(String, Value)]) -> Result<()> {
        let tx = self.db.begin_write()?;
        {
            let mut table = tx.open_table(PREFS_TABLE)?;
            for (key, value) in entries {
                let encoded = postcard::to_stdvec(value)?;
                table.insert(key.as_str(), &encoded[..])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove `key` and commit. Returns whether the key was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let tx = self.db.begin_write()?;
        let removed = {
            let mut table = tx.open_table(PREFS_TABLE)?;
            let removed = table.remove(key)?.is_some();
            removed
        };
        tx.commit()?;
        Ok(removed)
    }

    /// All keys currently stored, in table order.
    pub fn keys(&self) -> Result<Vec<String>> {
        let tx = self.db.begin_read()?;
        let table = tx.open_table(PREFS_TABLE)?;
        let mut keys = Vec::new();
        for row in table.iter()? {
            let (key, _) = row?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
