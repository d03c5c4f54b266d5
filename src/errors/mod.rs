//! Error taxonomy and status mapping.
//!
//! # Responsibilities
//! - Define the failure taxonomy for the dispatch pipeline
//! - Map each failure kind to an HTTP status and a machine error code
//! - Decide log severity per failure kind
//!
//! # Design Decisions
//! - One enum for the whole pipeline; collaborators convert into it
//! - "Not found" and "denied" are modeled as explicit result types at the
//!   call sites (`MatchResult`, `AccessResult`); these variants exist only
//!   for the moment a denied/missing outcome must cross the error boundary
//! - Status mapping lives on the type; hosts may override per error code

pub mod translator;

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use translator::{ErrorHook, ExceptionTranslator};

/// Failures produced while decoding or encoding payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("xml: {0}")]
    Xml(String),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("jsv parse error at byte {pos}: {message}")]
    Jsv { pos: usize, message: String },

    #[error("no codec registered for content type {0}")]
    UnknownContentType(String),

    #[error("value binding: {0}")]
    Binding(String),
}

/// Any failure raised between "a request has arrived" and "a response has
/// been serialized and sent".
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No route template or fallback resolver matched.
    #[error("no route matched {method} {path}")]
    RouteNotFound { method: String, path: String },

    /// An operation name resolved from the wire has no registration.
    #[error("unknown operation {name}")]
    UnknownOperation { name: String },

    /// Request deserialization / model binding failed.
    #[error("failed to bind request {type_name}")]
    RequestBinding {
        type_name: String,
        #[source]
        source: CodecError,
    },

    /// The negotiated format is disabled by configuration.
    #[error("content format {content_type} is not enabled")]
    UnauthorizedFormat { content_type: String },

    /// The operation's restriction flags exclude this caller.
    #[error("operation {operation} is restricted")]
    UnauthorizedAccess { operation: String },

    /// The invoked operation itself failed.
    #[error("operation {operation} failed: {message}")]
    OperationFault {
        operation: String,
        message: String,
        status: Option<u16>,
    },

    /// The response could not be serialized in the negotiated format.
    #[error("failed to serialize response as {content_type}")]
    Serialization {
        content_type: String,
        #[source]
        source: CodecError,
    },

    /// Mutation attempted after the host reached its ready state.
    #[error("host lifecycle violation: {0}")]
    Lifecycle(String),

    #[error("transport write failed")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    /// Convenience constructor for operation-level failures.
    pub fn fault(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OperationFault {
            operation: operation.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Operation failure with an explicit status code.
    pub fn fault_with_status(
        operation: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self::OperationFault {
            operation: operation.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }

    /// Default HTTP status for this failure kind. An explicit host-level
    /// map (keyed by [`error_code`](Self::error_code)) takes precedence.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            DispatchError::UnknownOperation { .. } => StatusCode::NOT_FOUND,
            DispatchError::RequestBinding { .. } => StatusCode::BAD_REQUEST,
            DispatchError::UnauthorizedFormat { .. } => StatusCode::FORBIDDEN,
            DispatchError::UnauthorizedAccess { .. } => StatusCode::FORBIDDEN,
            DispatchError::OperationFault { status, .. } => status
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            DispatchError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Lifecycle(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for error bodies and status overrides.
    pub fn error_code(&self) -> &'static str {
        match self {
            DispatchError::RouteNotFound { .. } => "route_not_found",
            DispatchError::UnknownOperation { .. } => "unknown_operation",
            DispatchError::RequestBinding { .. } => "request_binding",
            DispatchError::UnauthorizedFormat { .. } => "unauthorized_format",
            DispatchError::UnauthorizedAccess { .. } => "unauthorized_access",
            DispatchError::OperationFault { .. } => "operation_fault",
            DispatchError::Serialization { .. } => "serialization",
            DispatchError::Lifecycle(_) => "lifecycle",
            DispatchError::Io(_) => "io",
        }
    }

    /// Client-caused failures are logged at warn, the rest at error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Flatten the cause chain into a single detail string, used when the
    /// host opts into verbose error bodies.
    pub fn detail(&self) -> String {
        let mut out = format!("{self}");
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("; caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

/// Serialized error body, written in the request's negotiated format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(status: StatusCode, error: &DispatchError, verbose: bool) -> Self {
        Self {
            status: status.as_u16(),
            code: error.error_code().to_string(),
            message: error.to_string(),
            detail: verbose.then(|| error.detail()),
        }
    }
}
