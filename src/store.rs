//! The backing preference store: one independently committed database per
//! namespace.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tracing::info;

use self::namespaces::NamespaceDb;
use crate::value::Value;

mod namespaces;

/// File extension of the per-namespace database files.
const DB_EXT: &str = "redb";

/// A store of named, typed key-value namespaces.
///
/// Each namespace is its own [`NamespaceDb`], opened on first use and cached.
/// Namespaces commit independently; concurrent readers of a namespace observe
/// either the pre-write or the fully committed post-write state.
///
/// Cheaply cloneable; clones share the same databases.
#[derive(Debug, Clone)]
pub struct PrefStore {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    backing: Backing,
    namespaces: Mutex<HashMap<String, Arc<NamespaceDb>>>,
}

#[derive(Debug)]
enum Backing {
    Persistent(PathBuf),
    InMemory,
}

impl PrefStore {
    /// Open a store keeping one database file per namespace under `dir`.
    pub fn persistent(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create store directory at {}", dir.display()))?;
        info!("opening preference store at {}", dir.display());
        Ok(Self::new(Backing::Persistent(dir)))
    }

    /// Open a store keeping every namespace in memory.
    ///
    /// Nothing survives dropping the store; intended for tests and dry runs.
    pub fn in_memory() -> Result<Self> {
        info!("using in-memory preference store");
        Ok(Self::new(Backing::InMemory))
    }

    fn new(backing: Backing) -> Self {
        Self {
            inner: Arc::new(Inner {
                backing,
                namespaces: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn namespace(&self, name: &str) -> Result<Arc<NamespaceDb>> {
        let mut map = self.inner.namespaces.lock();
        if let Some(db) = map.get(name) {
            return Ok(db.clone());
        }
        let db = match &self.inner.backing {
            Backing::Persistent(dir) => {
                NamespaceDb::persistent(dir.join(format!("{name}.{DB_EXT}")))?
            }
            Backing::InMemory => NamespaceDb::in_memory()?,
        };
        let db = Arc::new(db);
        map.insert(name.to_string(), db.clone());
        Ok(db)
    }

    /// Read the raw tagged value stored under `(namespace, key)`.
    pub fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>> {
        self.namespace(namespace)?.get(key)
    }

    /// Read `(namespace, key)` as a string, falling back to `default` when
    /// the key is absent or holds a value of a different kind.
    pub fn get_string(&self, namespace: &str, key: &str, default: &str) -> Result<String> {
        match self.get(namespace, key)? {
            Some(Value::String(v)) => Ok(v),
            _ => Ok(default.to_string()),
        }
    }

    /// Read `(namespace, key)` as a 32-bit integer, falling back to `default`.
    pub fn get_int(&self, namespace: &str, key: &str, default: i32) -> Result<i32> {
        match self.get(namespace, key)? {
            Some(Value::Int(v)) => Ok(v),
            _ => Ok(default),
        }
    }

    /// Read `(namespace, key)` as a 64-bit integer, falling back to `default`.
    pub fn get_long(&self, namespace: &str, key: &str, default: i64) -> Result<i64> {
        match self.get(namespace, key)? {
            Some(Value::Long(v)) => Ok(v),
            _ => Ok(default),
        }
    }

    /// Read `(namespace, key)` as a float, falling back to `default`.
    pub fn get_float(&self, namespace: &str, key: &str, default: f32) -> Result<f32> {
        match self.get(namespace, key)? {
            Some(Value::Float(v)) => Ok(v),
            _ => Ok(default),
        }
    }

    /// Read `(namespace, key)` as a boolean, falling back to `default`.
    pub fn get_bool(&self, namespace: &str, key: &str, default: bool) -> Result<bool> {
        match self.get(namespace, key)? {
            Some(Value::Bool(v)) => Ok(v),
            _ => Ok(default),
        }
    }

    /// Write a batch of fields into one namespace and commit them as a unit.
    pub fn put(&self, namespace: &str, entries: &[(String, Value)]) -> Result<()> {
        self.namespace(namespace)?.put_batch(entries)
    }

    /// Remove `(namespace, key)` and commit. Returns whether the key existed;
    /// removing an absent key is not an error.
    pub fn remove(&self, namespace: &str, key: &str) -> Result<bool> {
        self.namespace(namespace)?.remove(key)
    }

    /// The keys currently stored in `namespace`.
    pub fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        self.namespace(namespace)?.keys()
    }

    /// The namespaces known to this store: every namespace opened through
    /// this handle and, for a persistent store, every database file on disk.
    pub fn namespaces(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.inner.namespaces.lock().keys().cloned().collect();
        if let Backing::Persistent(dir) = &self.inner.backing {
            for entry in std::fs::read_dir(dir)
                .with_context(|| format!("failed to read store directory {}", dir.display()))?
            {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) == Some(DB_EXT) {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn round_trip_all_kinds() -> TestResult {
        let store = PrefStore::in_memory()?;
        let entries = vec![
            ("name".to_string(), Value::String("zlm".to_string())),
            ("retries".to_string(), Value::Int(3)),
            ("epoch".to_string(), Value::Long(1_234_567_890_123)),
            ("ratio".to_string(), Value::Float(0.5)),
            ("enabled".to_string(), Value::Bool(true)),
        ];
        store.put("app", &entries)?;

        assert_eq!(store.get_string("app", "name", "")?, "zlm");
        assert_eq!(store.get_int("app", "retries", -1)?, 3);
        assert_eq!(store.get_long("app", "epoch", -1)?, 1_234_567_890_123);
        assert_eq!(store.get_float("app", "ratio", -1.0)?, 0.5);
        assert!(store.get_bool("app", "enabled", false)?);
        Ok(())
    }

    #[test]
    fn absent_key_yields_default() -> TestResult {
        let store = PrefStore::in_memory()?;
        assert_eq!(store.get_string("app", "missing", "fallback")?, "fallback");
        assert_eq!(store.get_int("app", "missing", 7)?, 7);
        assert!(!store.get_bool("app", "missing", false)?);
        Ok(())
    }

    #[test]
    fn wrong_kind_reads_as_absent() -> TestResult {
        let store = PrefStore::in_memory()?;
        store.put("app", &[("retries".to_string(), Value::Int(3))])?;
        assert_eq!(store.get_string("app", "retries", "fallback")?, "fallback");
        assert_eq!(store.get_long("app", "retries", -1)?, -1);
        Ok(())
    }

    #[test]
    fn remove_is_idempotent() -> TestResult {
        let store = PrefStore::in_memory()?;
        store.put("app", &[("name".to_string(), Value::String("zlm".into()))])?;
        assert!(store.remove("app", "name")?);
        assert!(!store.remove("app", "name")?);
        assert!(!store.remove("app", "never-there")?);
        Ok(())
    }

    #[test]
    fn namespaces_are_independent() -> TestResult {
        let store = PrefStore::in_memory()?;
        store.put("one", &[("k".to_string(), Value::Int(1))])?;
        store.put("two", &[("k".to_string(), Value::Int(2))])?;
        assert_eq!(store.get_int("one", "k", 0)?, 1);
        assert_eq!(store.get_int("two", "k", 0)?, 2);
        assert_eq!(store.keys("one")?, vec!["k".to_string()]);
        assert_eq!(store.namespaces()?, vec!["one".to_string(), "two".to_string()]);
        Ok(())
    }

    #[test]
    fn reopen_persists() -> TestResult {
        let dir = tempfile::tempdir()?;
        {
            let store = PrefStore::persistent(dir.path())?;
            store.put("app", &[("name".to_string(), Value::String("zlm".into()))])?;
        }
        let store = PrefStore::persistent(dir.path())?;
        assert_eq!(store.get_string("app", "name", "")?, "zlm");
        assert_eq!(store.namespaces()?, vec!["app".to_string()]);
        Ok(())
    }
}
