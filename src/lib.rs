//! A path-addressable gateway over typed key-value namespaces.
//!
//! Callers address a value with a hierarchical path: a leading type tag
//! selects the encoding, followed by the namespace, the key, and optionally
//! a default value, e.g. `integer/app/retry-count/3/`. The gateway resolves
//! the path, performs the typed read or write against a persistent
//! per-namespace store, and returns a single-row, single-column record (or
//! an insert/delete acknowledgement).
//!
//! The gateway is invoked synchronously by callers inside the same process;
//! there is no network surface. Namespaces are independently committed redb
//! databases, so concurrent readers of a namespace observe either the
//! pre-write or the fully committed post-write state.

#![deny(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod gateway;
pub mod metrics;
pub mod resolver;
mod store;
mod value;

pub use gateway::{Gateway, Row, COLUMN_NAME};
pub use store::PrefStore;
pub use value::{Value, ValueKind};
