//! Request path resolution.
//!
//! A request path encodes the storage coordinates of a value: a leading type
//! tag (or verb tag) followed by namespace, key, and an optional raw default,
//! e.g. `integer/app/retry-count/3/`. Resolution is shape-only: the resolver
//! matches the segment count and the leading tag against a fixed rule table
//! and extracts the remaining segments, without consulting the store.

use crate::value::ValueKind;

/// Leading tag of delete-shaped paths.
pub const DELETE_TAG: &str = "delete";
/// Tag of the bulk-write shape.
pub const PUTS_TAG: &str = "puts";

/// The operation a path shape selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Typed read of a single key.
    Get(ValueKind),
    /// Removal of a single key.
    Delete,
    /// Bulk write of caller-supplied fields.
    BulkPut,
}

/// The storage coordinates extracted from a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// The namespace holding the key, i.e. which backing database to use.
    pub namespace: String,
    /// The key inside the namespace, absent for keyless shapes.
    pub key: Option<String>,
    /// The raw default value of typed gets, coerced by the dispatcher.
    pub default: Option<String>,
}

/// A fully resolved request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The operation selected by the path shape.
    pub op: Operation,
    /// The extracted storage coordinates.
    pub address: Address,
}

/// Why a path failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// The path matches none of the known shapes.
    #[error("path matches no known shape")]
    NoMatch,
    /// The path shape matched but carries no namespace segment.
    #[error("path carries no namespace segment")]
    MissingNamespace,
}

/// Classify a path shape into an operation.
///
/// The shapes are disjoint by their leading tag, so at most one rule matches:
///
/// | shape                                   | operation     |
/// |-----------------------------------------|---------------|
/// | `{type}/{namespace}/`                   | typed get     |
/// | `{type}/{namespace}/{key}/`             | typed get     |
/// | `{type}/{namespace}/{key}/{default}/`   | typed get     |
/// | `delete/{namespace}/{key}/`             | delete        |
/// | `puts`                                  | bulk write    |
///
/// with `{type}` one of `string`, `integer`, `long`, `float`, `boolean`.
pub fn classify(path: &str) -> Result<Operation, ResolveError> {
    classify_segments(&segments(path))
}

/// Resolve a path into an operation and its storage coordinates.
///
/// The namespace segment is required for every shape; a path without one
/// fails here and must never reach the store.
pub fn resolve(path: &str) -> Result<Resolved, ResolveError> {
    let segs = segments(path);
    let op = classify_segments(&segs)?;
    let namespace = segs
        .get(1)
        .ok_or(ResolveError::MissingNamespace)?
        .to_string();
    let key = segs.get(2).map(|s| s.to_string());
    let default = segs.get(3).map(|s| s.to_string());
    Ok(Resolved {
        op,
        address: Address {
            namespace,
            key,
            default,
        },
    })
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn classify_segments(segs: &[&str]) -> Result<Operation, ResolveError> {
    let Some(tag) = segs.first() else {
        return Err(ResolveError::NoMatch);
    };
    if let Some(kind) = ValueKind::from_tag(tag) {
        return match segs.len() {
            2..=4 => Ok(Operation::Get(kind)),
            _ => Err(ResolveError::NoMatch),
        };
    }
    match (*tag, segs.len()) {
        (DELETE_TAG, 3) => Ok(Operation::Delete),
        (PUTS_TAG, 1) => Ok(Operation::BulkPut),
        _ => Err(ResolveError::NoMatch),
    }
}
