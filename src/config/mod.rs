//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HostConfig (validated, immutable)
//!     → owned by HostState, read-only after the ready transition
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the host is ready
//! - All fields have defaults to allow minimal configs
//! - Each option gates exactly one decision point in the pipeline

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::HostConfig;
pub use validation::{validate_config, ValidationError};
