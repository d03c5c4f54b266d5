//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (configuring phase):
//!     "/orders/{Id}" → template.rs (parse into segments)
//!     → RoutePathMatcher (registration order preserved)
//!
//! Per request:
//!     method + path → optional suffix strip (.json, .xml, ...)
//!     → first full template match wins
//!     → fallback resolver → MatchResult::NotFound
//! ```
//!
//! # Design Decisions
//! - Templates compiled at startup, immutable at runtime
//! - Deterministic: same (method, path) always yields the same match
//! - Explicit NotFound rather than an error; the caller maps it to 404
//! - Wildcard templates see the unstripped path; others the stripped one

pub mod matcher;
pub mod template;

pub use matcher::{FallbackResolver, FallbackTarget, MatchResult, RouteMatch, RoutePathMatcher};
pub use template::RouteTemplate;
