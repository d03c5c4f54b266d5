//! Outbound response abstraction.
//!
//! # Responsibilities
//! - Expose status/header/body mutation to the pipeline
//! - Track the "closed" flag (a terminal write has occurred)
//! - Track finalization, including the no-headers mode used when headers
//!   were already on the wire before a failure

use std::io;

use http::{HeaderMap, HeaderValue, StatusCode};

/// Mutable response handle owned by the hosting transport.
///
/// The pipeline writes through this trait and never assumes buffering;
/// [`BufferedResponse`] is the in-memory implementation used by embedded
/// hosts and tests. `body()` is the buffered representation — streaming
/// implementations may return an empty slice.
pub trait ResponseTransport: Send {
    fn status(&self) -> StatusCode;
    fn set_status(&mut self, status: StatusCode);

    fn headers(&self) -> &HeaderMap;
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Append a chunk to the response body. The first successful write
    /// commits the headers.
    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()>;

    fn body(&self) -> &[u8];

    fn bytes_written(&self) -> usize {
        self.body().len()
    }

    /// Mark the response terminally written. Later pipeline stages must not
    /// write once this is set.
    fn close(&mut self);
    fn is_closed(&self) -> bool;

    /// True once any body byte (and therefore the header block) went out.
    fn headers_started(&self) -> bool;

    /// Flush and seal the response. `with_headers = false` is the degraded
    /// mode used when the header block was already sent before a failure.
    fn finalize(&mut self, with_headers: bool);
    fn is_finalized(&self) -> bool;

    fn set_content_type(&mut self, value: &str) {
        if let Ok(v) = HeaderValue::from_str(value) {
            self.headers_mut().insert(http::header::CONTENT_TYPE, v);
        }
    }
}

/// In-memory response used by embedded hosts and the test suites.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
    closed: bool,
    finalized: bool,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or("")
    }
}

impl ResponseTransport for BufferedResponse {
    fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_body(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    fn body(&self) -> &[u8] {
        &self.body
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn headers_started(&self) -> bool {
        !self.body.is_empty()
    }

    fn finalize(&mut self, _with_headers: bool) {
        self.finalized = true;
    }

    fn is_finalized(&self) -> bool {
        self.finalized
    }
}
