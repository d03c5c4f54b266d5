//! Host state subsystem.
//!
//! # Data Flow
//! ```text
//! HostState::new(config)          (configuring phase)
//!     → register operations, routes, filters, binders, hooks
//!     → into_ready()              (one-time transition)
//!     → Arc<HostState> shared with the dispatcher; read-only thereafter
//! ```
//!
//! # Design Decisions
//! - The ready transition is an atomic one-time flip
//! - Mutation after ready is a runtime error, not a convention
//! - No lock on any read path: tables are build-once, read-many

pub mod state;

pub use state::{HostState, RequestBinder};
