//! Operation registry subsystem.
//!
//! # Data Flow
//! ```text
//! Service registration (configuring phase):
//!     typed handler + OperationDef
//!     → Operation (bound invoker, typed codecs, sorted filters)
//!     → OperationRegistry (name + method → operation)
//!
//! Per request:
//!     resolved operation name → find(name, method) → Arc<Operation>
//! ```
//!
//! # Design Decisions
//! - Registry is build-once, read-many; no lock on the lookup path
//! - Invokers and codecs are bound once at registration, never re-derived
//! - Explicit `None` on a miss; the caller decides the failure shape

pub mod attributes;
pub mod container;
pub mod operation;

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;

pub use attributes::{MetadataVisibility, RequestAttributes};
pub use container::{NullContainer, ServiceContainer};
pub use operation::{
    BoxFuture, Invoker, MethodMatch, Operation, OperationDef, XmlStrategy,
};

/// Lookup table from operation name (and HTTP method) to metadata.
#[derive(Default)]
pub struct OperationRegistry {
    by_name: HashMap<String, Vec<Arc<Operation>>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operation, returning the shared handle route templates
    /// bind to.
    pub fn insert(&mut self, operation: Operation) -> Arc<Operation> {
        let op = Arc::new(operation);
        self.by_name
            .entry(op.name.to_ascii_lowercase())
            .or_default()
            .push(op.clone());
        op
    }

    /// Find an operation by name and method. An exact method registration
    /// wins over a wildcard one.
    pub fn find(&self, name: &str, method: &Method) -> Option<Arc<Operation>> {
        let candidates = self.by_name.get(&name.to_ascii_lowercase())?;
        candidates
            .iter()
            .find(|op| matches!(op.method, MethodMatch::Exact(ref m) if m == method))
            .or_else(|| {
                candidates
                    .iter()
                    .find(|op| matches!(op.method, MethodMatch::Any))
            })
            .cloned()
    }

    /// Operation names visible under the given metadata scope — the listing
    /// a metadata page would consume.
    pub fn visible_operations(&self, scope: MetadataVisibility) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_name
            .values()
            .flatten()
            .filter(|op| op.visibility.intersects(scope))
            .map(|op| op.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
