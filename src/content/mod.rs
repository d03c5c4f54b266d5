//! Content format negotiation subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path suffix, query override, headers)
//!     → resolver.rs (precedence chain)
//!     → format.rs (content-type table lookup)
//!     → Allowed(Format) | Denied (feature-disabled format)
//! ```
//!
//! # Design Decisions
//! - Precedence is fixed: route suffix > query override > headers > default
//! - Disabled formats are rejected before any body work happens
//! - The content-type table is extensible so hosts can alias vendor types

pub mod format;
pub mod resolver;

pub use format::{ContentTypeRegistry, Format, SoapVersion};
pub use resolver::{AccessResult, ContentFormatResolver};
