//! The typed dispatcher: executes resolved requests against the store.
//!
//! The gateway exposes the four request verbs (query, insert, update,
//! delete). Each verb resolves its path, dispatches on the resulting
//! operation, and maps the outcome to that verb's result convention: a
//! single-row record for reads, the echoed path for writes, a status code
//! for deletes. Unresolved addresses short-circuit before the store.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, trace};

use crate::{
    metrics::Metrics,
    resolver::{resolve, Address, Operation},
    store::PrefStore,
    value::{Value, ValueKind},
};

/// Column identifier of every read result.
pub const COLUMN_NAME: &str = "value";

/// Sentinel substituted for integer and long defaults that are not plain
/// decimal digits.
pub const SENTINEL_DEFAULT: i64 = -1;

/// Namespace reserved for gateway bookkeeping.
pub const AUTHORITY_NAMESPACE: &str = "gateway-meta";
/// Key under which the gateway's authority identifier is persisted.
pub const AUTHORITY_KEY: &str = "authority";

/// The single-row, single-column record returned by a read.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Column identifier, always [`COLUMN_NAME`].
    pub column: &'static str,
    /// The value read, coerced to the requested kind.
    pub value: Value,
}

impl Row {
    fn new(value: Value) -> Self {
        Self {
            column: COLUMN_NAME,
            value,
        }
    }
}

/// A gateway over a [`PrefStore`], dispatching path-addressed requests.
///
/// Cheaply cloneable; clones share the store and metrics.
#[derive(Debug, Clone)]
pub struct Gateway {
    store: PrefStore,
    authority: String,
    metrics: Arc<Metrics>,
}

impl Gateway {
    /// Create a gateway over `store`.
    ///
    /// Persists `authority` under the reserved
    /// ([`AUTHORITY_NAMESPACE`], [`AUTHORITY_KEY`]) slot so that other
    /// components can discover which gateway owns this store. Call once per
    /// process lifetime.
    pub fn new(store: PrefStore, authority: impl Into<String>) -> Result<Self> {
        let authority = authority.into();
        store
            .put(
                AUTHORITY_NAMESPACE,
                &[(AUTHORITY_KEY.to_string(), Value::String(authority.clone()))],
            )
            .context("failed to register gateway authority")?;
        debug!("registered gateway authority {authority:?}");
        Ok(Self {
            store,
            authority,
            metrics: Arc::new(Metrics::default()),
        })
    }

    /// The authority identifier registered at construction.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// The backing store.
    pub fn store(&self) -> &PrefStore {
        &self.store
    }

    /// The gateway's metrics.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Read one value.
    ///
    /// Returns a single-row record holding the value coerced to the kind the
    /// path's type tag requests, `None` if the path does not resolve or does
    /// not name a typed get. A malformed float default is an error; malformed
    /// integer and long defaults degrade to [`SENTINEL_DEFAULT`].
    pub fn query(&self, path: &str) -> Result<Option<Row>> {
        self.metrics.queries.inc();
        let Some(resolved) = self.resolve_path(path) else {
            return Ok(None);
        };
        let Operation::Get(kind) = resolved.op else {
            // only typed gets produce rows under the read verb
            self.metrics.query_empty.inc();
            return Ok(None);
        };
        let value = self.read_typed(kind, &resolved.address)?;
        trace!("query {path:?} -> {value}");
        self.metrics.query_rows.inc();
        Ok(Some(Row::new(value)))
    }

    /// Write `fields` into the namespace `path` resolves to.
    ///
    /// Every field is stored under its own key, then the batch is committed
    /// as a unit. Returns the path unchanged as acknowledgement, or `None`
    /// if the path does not resolve. Delete-shaped paths are acknowledged
    /// without writing.
    pub fn insert(&self, path: &str, fields: &[(String, Value)]) -> Result<Option<String>> {
        self.metrics.puts.inc();
        let Some(resolved) = self.resolve_path(path) else {
            return Ok(None);
        };
        match resolved.op {
            Operation::Get(_) | Operation::BulkPut => {
                self.store
                    .put(&resolved.address.namespace, fields)
                    .with_context(|| {
                        format!("bulk write into {:?} failed", resolved.address.namespace)
                    })?;
                self.metrics.fields_written.inc_by(fields.len() as u64);
                self.metrics.commits.inc();
                trace!(
                    "put {} fields into {:?}",
                    fields.len(),
                    resolved.address.namespace
                );
            }
            Operation::Delete => {
                trace!("write verb on delete-shaped path {path:?}, nothing written");
            }
        }
        Ok(Some(path.to_string()))
    }

    /// Write `fields` into the namespace `path` resolves to.
    ///
    /// Insert and update share one bulk-write behavior; there is no separate
    /// merge semantic.
    pub fn update(&self, path: &str, fields: &[(String, Value)]) -> Result<Option<String>> {
        self.insert(path, fields)
    }

    /// Remove the key `path` resolves to and commit.
    ///
    /// Returns `0` on any resolved attempt, whether or not the key existed,
    /// and `-1` if the path does not resolve. A resolved path without a key
    /// segment removes nothing.
    pub fn delete(&self, path: &str) -> Result<i64> {
        self.metrics.deletes.inc();
        let Some(resolved) = self.resolve_path(path) else {
            return Ok(-1);
        };
        if let Some(key) = resolved.address.key.as_deref() {
            let removed = self.store.remove(&resolved.address.namespace, key)?;
            self.metrics.commits.inc();
            if removed {
                self.metrics.keys_removed.inc();
            }
            trace!(
                "delete {key:?} from {:?}: removed={removed}",
                resolved.address.namespace
            );
        }
        Ok(0)
    }

    fn resolve_path(&self, path: &str) -> Option<crate::resolver::Resolved> {
        match resolve(path) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                debug!("unresolved path {path:?}: {err}");
                self.metrics.unresolved.inc();
                None
            }
        }
    }

    /// Execute a typed get: coerce the raw default, then read through the
    /// store's typed getter. An absent key segment behaves like an absent
    /// entry, so the default decides the result.
    fn read_typed(&self, kind: ValueKind, address: &Address) -> Result<Value> {
        let namespace = address.namespace.as_str();
        let key = address.key.as_deref();
        let raw = address.default.as_deref();
        let value = match kind {
            ValueKind::String => {
                let default = raw.unwrap_or("");
                Value::String(match key {
                    Some(key) => self.store.get_string(namespace, key, default)?,
                    None => default.to_string(),
                })
            }
            ValueKind::Int => {
                let default = match raw {
                    None => 0,
                    Some(raw) => self.coerce_int_default(raw)?,
                };
                Value::Int(match key {
                    Some(key) => self.store.get_int(namespace, key, default)?,
                    None => default,
                })
            }
            ValueKind::Long => {
                let default = match raw {
                    None => 0,
                    Some(raw) => self.coerce_long_default(raw)?,
                };
                Value::Long(match key {
                    Some(key) => self.store.get_long(namespace, key, default)?,
                    None => default,
                })
            }
            ValueKind::Float => {
                let default = match raw {
                    None => 0.0,
                    // no digits-only guard here: a malformed float default is
                    // the caller's error and propagates
                    Some(raw) => raw
                        .parse::<f32>()
                        .with_context(|| format!("invalid float default {raw:?}"))?,
                };
                Value::Float(match key {
                    Some(key) => self.store.get_float(namespace, key, default)?,
                    None => default,
                })
            }
            ValueKind::Bool => {
                let default = raw.map(|raw| raw.eq_ignore_ascii_case("true")).unwrap_or(false);
                Value::Bool(match key {
                    Some(key) => self.store.get_bool(namespace, key, default)?,
                    None => default,
                })
            }
        };
        Ok(value)
    }

    fn coerce_int_default(&self, raw: &str) -> Result<i32> {
        if !digits_only(raw) {
            self.metrics.sentinel_defaults.inc();
            debug!("non-digit integer default {raw:?}, substituting sentinel");
            return Ok(SENTINEL_DEFAULT as i32);
        }
        raw.parse()
            .with_context(|| format!("integer default {raw:?} out of range"))
    }

    fn coerce_long_default(&self, raw: &str) -> Result<i64> {
        if !digits_only(raw) {
            self.metrics.sentinel_defaults.inc();
            debug!("non-digit long default {raw:?}, substituting sentinel");
            return Ok(SENTINEL_DEFAULT);
        }
        raw.parse()
            .with_context(|| format!("long default {raw:?} out of range"))
    }
}

/// Whether `s` consists purely of decimal digits.
///
/// Signs are rejected on purpose: a default of `-5` is not digits-only and
/// degrades to the sentinel like any other malformed numeric default.
fn digits_only(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn gateway() -> Result<Gateway> {
        Gateway::new(PrefStore::in_memory()?, "gateway.test")
    }

    #[test]
    fn digits_only_rejects_signs_and_junk() {
        assert!(digits_only("0"));
        assert!(digits_only("12345"));
        assert!(!digits_only(""));
        assert!(!digits_only("-1"));
        assert!(!digits_only("+1"));
        assert!(!digits_only("1.5"));
        assert!(!digits_only("abc"));
    }

    #[test]
    fn keyless_get_yields_the_default() -> TestResult {
        let gw = gateway()?;
        let row = gw.query("integer/app/")?.unwrap();
        assert_eq!(row.value, Value::Int(0));
        Ok(())
    }

    #[test]
    fn overflowing_digit_default_is_an_error() -> TestResult {
        let gw = gateway()?;
        assert!(gw.query("integer/app/key/99999999999999999999/").is_err());
        assert!(gw.query("long/app/key/99999999999999999999/").is_err());
        Ok(())
    }

    #[test]
    fn delete_without_key_is_a_resolved_noop() -> TestResult {
        let gw = gateway()?;
        gw.insert("string/app/", &[("name".to_string(), "zlm".into())])?;
        // typed shape without a key segment: resolved, nothing to remove
        assert_eq!(gw.delete("string/app/")?, 0);
        assert_eq!(
            gw.query("string/app/name/")?.unwrap().value,
            Value::String("zlm".to_string())
        );
        Ok(())
    }

    #[test]
    fn write_verb_on_delete_shape_writes_nothing() -> TestResult {
        let gw = gateway()?;
        let ack = gw.insert("delete/app/name/", &[("name".to_string(), "zlm".into())])?;
        assert_eq!(ack.as_deref(), Some("delete/app/name/"));
        assert_eq!(
            gw.query("string/app/name/")?.unwrap().value,
            Value::String(String::new())
        );
        Ok(())
    }
}
