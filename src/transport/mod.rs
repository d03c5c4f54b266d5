//! Transport request/response abstraction.
//!
//! # Data Flow
//! ```text
//! hosting process (listener, out of scope)
//!     → TransportRequest (method, path, query, headers, body bytes)
//!     → dispatch pipeline
//!     → ResponseTransport (status, headers, body writes, closed flag)
//!     → hosting process sends the finalized response
//! ```
//!
//! # Design Decisions
//! - The core never accepts sockets; it consumes already-parsed requests
//! - Bodies are `Bytes`: the listener owns streaming concerns
//! - The response side is a trait so hosts can stream; a buffered
//!   implementation is provided for in-process hosting and tests

pub mod request;
pub mod response;

pub use request::TransportRequest;
pub use response::{BufferedResponse, ResponseTransport};
