//! Filter subsystem.
//!
//! # Data Flow
//! ```text
//! pre-request filters (raw, before the request object exists)
//!     → request filters: attr(priority < 0) → globals → attr(priority >= 0)
//!     → operation invocation
//!     → response filters: attr(priority < 0) → globals → attr(priority >= 0)
//! ```
//!
//! # Design Decisions
//! - Filter lists are built at registration; no runtime type introspection
//! - The global list runs strictly between the two attribute priority
//!   groups — that insertion point is externally observable and fixed
//! - Every single invocation is followed by a closed-response check

pub mod chain;

pub use chain::{AttributeFilter, FilterChain, GlobalFilter, PreRequestFilter};
