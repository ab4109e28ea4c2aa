//! HTTP/1.1 response builder.
//!
//! Provides a fluent builder API for constructing responses. Bodies are
//! [`Bytes`], so a cached body can be handed to many responses without copying.

use bytes::Bytes;

use super::{Headers, StatusCode, names};

/// An HTTP/1.1 response produced by an origin or replayed from the cache.
///
/// # Examples
///
/// ```
/// use rttp_cache::http::{Response, StatusCode};
///
/// let response = Response::new(StatusCode::Ok)
///     .header("Cache-Control", "max-age=10, public")
///     .body("hello");
///
/// assert_eq!(response.status(), StatusCode::Ok);
/// assert_eq!(response.headers().get("cache-control"), Some("max-age=10, public"));
/// assert_eq!(response.payload().as_ref(), b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a new response with the given status and an empty body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    /// Creates a `304 Not Modified` response. The body is always empty.
    pub fn not_modified() -> Self {
        Self::new(StatusCode::NotModified)
    }

    /// Reassembles a response from its parts.
    pub fn from_parts(status: StatusCode, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Appends a response header. Multiple calls with the same name are additive.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces every value of a header in-place.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.set(name, value);
    }

    /// Sets the response body from a string.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Bytes::from(body.into());
        self
    }

    /// Returns the status code of this response.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the response headers for in-place modification.
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// Returns the response body.
    pub fn payload(&self) -> &Bytes {
        &self.body
    }

    /// Returns the `Cache-Control` header value, if set.
    pub fn cache_control(&self) -> Option<&str> {
        self.headers.get(names::CACHE_CONTROL)
    }

    /// Returns `true` for a `304 Not Modified` response.
    pub fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NotModified
    }
}
