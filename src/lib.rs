//! Multi-format service dispatch host.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                SERVICE HOST                   │
//!                      │                                               │
//!   TransportRequest   │  ┌─────────┐   ┌─────────┐   ┌────────────┐  │
//!   ───────────────────┼─▶│ routing │──▶│ content │──▶│  dispatch  │  │
//!                      │  │ matcher │   │ resolve │   │  pipeline  │  │
//!                      │  └─────────┘   └─────────┘   └─────┬──────┘  │
//!                      │                                     │         │
//!                      │               ┌─────────────────────┤         │
//!                      │               ▼                     ▼         │
//!                      │        ┌────────────┐        ┌────────────┐   │
//!                      │        │  filters   │        │    soap    │   │
//!                      │        │   chain    │        │  endpoint  │   │
//!                      │        └─────┬──────┘        └─────┬──────┘   │
//!                      │              ▼                     │          │
//!                      │        ┌────────────┐              │          │
//!                      │        │  registry  │◀─────────────┘          │
//!                      │        │  invoker   │                         │
//!                      │        └─────┬──────┘                         │
//!   Response           │              ▼                                │
//!   ◀──────────────────┼── serializers (json / xml / jsv / csv)        │
//!                      │                                               │
//!                      │  cross-cutting: config, errors, observability │
//!                      └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod content;
pub mod dispatch;
pub mod errors;
pub mod filters;
pub mod host;
pub mod observability;
pub mod registry;
pub mod routing;
pub mod serializers;
pub mod soap;
pub mod transport;

pub use config::HostConfig;
pub use dispatch::{DispatchOutcome, Dispatcher, RequestContext};
pub use errors::DispatchError;
pub use host::HostState;
pub use registry::{Operation, OperationDef, RequestAttributes};
pub use transport::{BufferedResponse, TransportRequest};
