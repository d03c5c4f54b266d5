//! SOAP endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! POST body (SOAP 1.1 / 1.2 envelope)
//!     → envelope.rs (version, header Action, raw Body fragment)
//!     → processor.rs (action resolution → operation, body decode)
//!     → invoker → reply envelope (or 202 for one-way)
//! ```
//!
//! # Design Decisions
//! - The Body fragment is captured as raw text and handed to the
//!   operation's XML codec; the envelope layer never deserializes payloads
//! - Action resolution precedence: transport header, envelope header,
//!   body root element name
//! - One-way operations never produce a reply envelope, fault included

pub mod envelope;
pub mod processor;

pub use envelope::{
    build_envelope, build_fault_body, parse_envelope, root_local_name, SoapEnvelope,
};
pub use processor::{decode_request, encode_reply, resolve_action};
