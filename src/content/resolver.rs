//! Content format resolution.
//!
//! # Responsibilities
//! - Decide the wire format for a request
//! - Apply the precedence chain: route suffix, query override, SOAP
//!   detection, Content-Type/Accept headers, host default
//! - Gate feature-disabled formats before any deserialization work

use crate::config::HostConfig;
use crate::content::format::{ContentTypeRegistry, Format};
use crate::transport::TransportRequest;

/// Outcome of format negotiation. `Denied` is produced for formats the host
/// configuration disables; the caller maps it to a 403-equivalent without
/// touching the body.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessResult {
    Allowed(Format),
    Denied { content_type: String },
}

/// Pure negotiation over the request line, headers, and host options.
pub struct ContentFormatResolver<'a> {
    config: &'a HostConfig,
    content_types: &'a ContentTypeRegistry,
}

impl<'a> ContentFormatResolver<'a> {
    pub fn new(config: &'a HostConfig, content_types: &'a ContentTypeRegistry) -> Self {
        Self {
            config,
            content_types,
        }
    }

    /// Resolve the format, honoring a suffix override produced by route
    /// matching (highest precedence), then gate it against the enabled set.
    pub fn resolve(
        &self,
        request: &TransportRequest,
        suffix_format: Option<Format>,
    ) -> AccessResult {
        let format = self.negotiate(request, suffix_format);
        if self.config.enabled_formats.contains(&format) {
            AccessResult::Allowed(format)
        } else {
            AccessResult::Denied {
                content_type: format.content_type().to_string(),
            }
        }
    }

    fn negotiate(&self, request: &TransportRequest, suffix_format: Option<Format>) -> Format {
        // (a) path-suffix override set by the route matcher
        if let Some(format) = suffix_format {
            return format;
        }

        // (b) explicit query-string override
        if let Some(format) = request.query_value("format").and_then(Format::from_name) {
            return format;
        }

        // (c) header negotiation. SOAP is detected first: the 1.2 content
        // type, or a SOAPAction header marking a 1.1 call over text/xml.
        if let Some(ct) = request.content_type() {
            if self.content_types.lookup(ct) == Some(Format::Soap12) {
                return Format::Soap12;
            }
        }
        if request.header_str("soapaction").is_some() {
            return Format::Soap11;
        }
        if !request.body.is_empty() {
            if let Some(format) = request.content_type().and_then(|ct| self.content_types.lookup(ct)) {
                return format;
            }
        }
        if let Some(accept) = request.header_str(http::header::ACCEPT.as_str()) {
            for candidate in accept.split(',') {
                if let Some(format) = self.content_types.lookup(candidate) {
                    return format;
                }
            }
        }

        // (d) host default
        self.content_types
            .lookup(&self.config.default_content_type)
            .unwrap_or(Format::Json)
    }
}
