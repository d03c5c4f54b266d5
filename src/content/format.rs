//! Wire formats and the content-type lookup table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// SOAP protocol version tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoapVersion {
    Soap11,
    Soap12,
}

impl SoapVersion {
    /// Envelope namespace for this version.
    pub fn envelope_namespace(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
            SoapVersion::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    /// Content type stamped on reply envelopes.
    pub fn content_type(&self) -> &'static str {
        match self {
            SoapVersion::Soap11 => "text/xml; charset=utf-8",
            SoapVersion::Soap12 => "application/soap+xml",
        }
    }
}

/// A wire representation negotiated per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Xml,
    Jsv,
    Csv,
    Soap11,
    Soap12,
}

impl Format {
    /// Canonical content type emitted for responses in this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
            Format::Jsv => "text/jsv",
            Format::Csv => "text/csv",
            Format::Soap11 => "text/xml; charset=utf-8",
            Format::Soap12 => "application/soap+xml",
        }
    }

    /// Path-extension suffix recognized by route matching (`.json`, ...).
    /// SOAP formats have no suffix form.
    pub fn from_suffix(suffix: &str) -> Option<Format> {
        match suffix {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            "jsv" => Some(Format::Jsv),
            "csv" => Some(Format::Csv),
            _ => None,
        }
    }

    /// Name accepted by the `format=` query override.
    pub fn from_name(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            "jsv" => Some(Format::Jsv),
            "csv" => Some(Format::Csv),
            "soap11" => Some(Format::Soap11),
            "soap12" => Some(Format::Soap12),
            _ => None,
        }
    }

    pub fn soap_version(&self) -> Option<SoapVersion> {
        match self {
            Format::Soap11 => Some(SoapVersion::Soap11),
            Format::Soap12 => Some(SoapVersion::Soap12),
            _ => None,
        }
    }

    pub fn is_soap(&self) -> bool {
        self.soap_version().is_some()
    }
}

/// Content-type string → format table, seeded with the well-known types and
/// extensible with host-registered aliases (e.g. vendor `+json` types).
///
/// This is the serializer-resolution capability the pipeline consults: an
/// unknown content type yields `None` and the caller falls back to the
/// default-instance path.
#[derive(Debug, Clone)]
pub struct ContentTypeRegistry {
    by_content_type: HashMap<String, Format>,
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        let mut reg = Self {
            by_content_type: HashMap::new(),
        };
        reg.register("application/json", Format::Json);
        reg.register("text/json", Format::Json);
        reg.register("application/xml", Format::Xml);
        reg.register("text/xml", Format::Xml);
        reg.register("text/jsv", Format::Jsv);
        reg.register("application/jsv", Format::Jsv);
        reg.register("text/csv", Format::Csv);
        reg.register("application/csv", Format::Csv);
        reg.register("application/soap+xml", Format::Soap12);
        reg
    }
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or override a content-type alias.
    pub fn register(&mut self, content_type: &str, format: Format) {
        self.by_content_type
            .insert(content_type.to_ascii_lowercase(), format);
    }

    /// Look up a content type, ignoring parameters and case.
    pub fn lookup(&self, content_type: &str) -> Option<Format> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        self.by_content_type.get(&essence).copied()
    }
}
