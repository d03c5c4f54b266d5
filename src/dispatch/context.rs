//! Per-request mutable state threaded through the pipeline.

use std::collections::HashMap;

use uuid::Uuid;

use crate::content::Format;
use crate::registry::RequestAttributes;
use crate::transport::{ResponseTransport, TransportRequest};

/// Everything a filter or handler may read or mutate while one request is
/// in flight. Owned by the dispatcher; never shared across requests.
pub struct RequestContext {
    pub request: TransportRequest,
    pub response: Box<dyn ResponseTransport>,
    /// Negotiated wire format for the reply.
    pub format: Format,
    pub operation_name: String,
    /// Correlation id stamped on every log line for this request.
    pub request_id: Uuid,
    /// Free-form string bag for cross-filter coordination.
    pub bag: HashMap<String, String>,
    pub route_params: Vec<(String, String)>,
    pub attributes: RequestAttributes,
    /// Set when a failure must surface as status-only (one-way SOAP).
    pub suppress_error_body: bool,
}

impl RequestContext {
    pub fn new(
        request: TransportRequest,
        response: Box<dyn ResponseTransport>,
        format: Format,
        operation_name: String,
    ) -> Self {
        Self {
            request,
            response,
            format,
            operation_name,
            request_id: Uuid::new_v4(),
            bag: HashMap::new(),
            route_params: Vec::new(),
            attributes: RequestAttributes::empty(),
            suppress_error_body: false,
        }
    }

    /// Stash a value other filters in the chain can read.
    pub fn set_bag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.bag.insert(key.into(), value.into());
    }

    pub fn bag_value(&self, key: &str) -> Option<&str> {
        self.bag.get(key).map(String::as_str)
    }

    pub fn route_param(&self, name: &str) -> Option<&str> {
        self.route_params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
