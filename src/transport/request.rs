//! Inbound request representation.

use bytes::Bytes;
use http::{HeaderMap, Method};

/// An already-parsed inbound request handed over by the hosting transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Parse and attach a raw query string (`a=1&b=two`).
    pub fn with_query_string(mut self, raw: &str) -> Self {
        self.query = url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect();
        self
    }

    pub fn with_header<N>(mut self, name: N, value: &str) -> Self
    where
        N: TryInto<http::header::HeaderName>,
    {
        if let (Ok(name), Ok(v)) = (name.try_into(), http::HeaderValue::from_str(value)) {
            self.headers.insert(name, v);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First query value for `name`, if any.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Content-Type header value with parameters stripped.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(http::header::CONTENT_TYPE.as_str())
            .map(|ct| ct.split(';').next().unwrap_or(ct).trim())
    }

    /// Body parsed as `application/x-www-form-urlencoded` fields.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }
}
