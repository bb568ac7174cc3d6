//! HTTP request representation.
//!
//! A [`Request`] is the fully decoded form of one HTTP/1.1 request: method,
//! path, raw query parameters, headers, an optional body and the session id
//! carried by the `Cookie` header. Instances are produced by the request
//! decoder; [`RequestBuilder`] exists so handlers can be exercised without a
//! socket.

use std::time::SystemTime;

use bytes::Bytes;

use super::{Headers, Method};

/// A decoded HTTP request.
///
/// Query parameter values are kept exactly as they appeared on the wire —
/// percent-decoding is a utility applied by handlers on demand, never by the
/// decoder.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
    query: Vec<(String, String)>,
    headers: Headers,
    body: Option<Bytes>,
    session_id: Option<String>,
    received_at: SystemTime,
}

impl Request {
    pub(crate) fn from_parts(
        method: Method,
        path: String,
        version: String,
        query: Vec<(String, String)>,
        headers: Headers,
        session_id: Option<String>,
        received_at: SystemTime,
    ) -> Self {
        Self { method, path, version, query, headers, body: None, session_id, received_at }
    }

    pub(crate) fn set_body(&mut self, body: Bytes) {
        self.body = Some(body);
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The request path with the query string already split off.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// First value of the named header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// First value of the named query parameter. Names match exactly and
    /// duplicates resolve in first-occurrence order.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(param_name, _)| param_name == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map(Bytes::len).unwrap_or(0)
    }

    /// Session id extracted from the `Cookie` header's `session_id` attribute.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn received_at(&self) -> SystemTime {
        self.received_at
    }
}

/// Builder for assembling a [`Request`] by hand, mainly in handler tests.
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    path: String,
    version: String,
    query: Vec<(String, String)>,
    headers: Headers,
    body: Option<Bytes>,
    session_id: Option<String>,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::Get,
            path: "/".to_string(),
            version: "HTTP/1.1".to_string(),
            query: Vec::new(),
            headers: Headers::new(),
            body: None,
            session_id: None,
        }
    }
}

impl RequestBuilder {
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn build(self) -> Request {
        let mut request = Request::from_parts(
            self.method,
            self.path,
            self.version,
            self.query,
            self.headers,
            self.session_id,
            SystemTime::now(),
        );
        if let Some(body) = self.body {
            request.set_body(body);
        }
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_roundtrip() {
        let request = Request::builder()
            .method(Method::Post)
            .path("/api/items")
            .query_param("page", "2")
            .query_param("page", "3")
            .header("Content-Type", "application/json")
            .body(&b"{}"[..])
            .session_id("abc")
            .build();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.path(), "/api/items");
        assert_eq!(request.query_param("page"), Some("2"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body(), Some(&b"{}"[..]));
        assert_eq!(request.body_len(), 2);
        assert_eq!(request.session_id(), Some("abc"));
    }
}
