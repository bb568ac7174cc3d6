//! HTTP response representation.
//!
//! [`Response`] owns its body until the encoder writes it to the wire. Status
//! codes and content types are closed enumerations: every status carries its
//! canonical reason phrase and every content type maps to exactly one MIME
//! string.

use bytes::Bytes;

use super::Headers;

/// The status codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    MovedPermanently = 301,
    Found = 302,
    NotModified = 304,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    Conflict = 409,
    InternalServerError = 500,
    NotImplemented = 501,
    ServiceUnavailable = 503,
}

impl Status {
    pub fn code(self) -> u16 {
        self as u16
    }

    /// The fixed reason phrase written after the code in the status line.
    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::Accepted => "Accepted",
            Status::NoContent => "No Content",
            Status::MovedPermanently => "Moved Permanently",
            Status::Found => "Found",
            Status::NotModified => "Not Modified",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::Conflict => "Conflict",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::ServiceUnavailable => "Service Unavailable",
        }
    }
}

/// Content types this server emits, each mapping to exactly one MIME string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Html,
    Plain,
    Json,
    Xml,
    Css,
    JavaScript,
    Png,
    Jpeg,
    OctetStream,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Html => "text/html; charset=utf-8",
            ContentType::Plain => "text/plain; charset=utf-8",
            ContentType::Json => "application/json; charset=utf-8",
            ContentType::Xml => "application/xml; charset=utf-8",
            ContentType::Css => "text/css; charset=utf-8",
            ContentType::JavaScript => "text/javascript; charset=utf-8",
            ContentType::Png => "image/png",
            ContentType::Jpeg => "image/jpeg",
            ContentType::OctetStream => "application/octet-stream",
        }
    }

    /// Detects a content type from a file path's extension,
    /// case-insensitively. Unrecognized extensions fall back to
    /// `application/octet-stream`.
    pub fn from_path(path: &str) -> Self {
        let Some((_, extension)) = path.rsplit_once('.') else {
            return ContentType::OctetStream;
        };

        if extension.eq_ignore_ascii_case("html") || extension.eq_ignore_ascii_case("htm") {
            ContentType::Html
        } else if extension.eq_ignore_ascii_case("css") {
            ContentType::Css
        } else if extension.eq_ignore_ascii_case("js") {
            ContentType::JavaScript
        } else if extension.eq_ignore_ascii_case("json") {
            ContentType::Json
        } else if extension.eq_ignore_ascii_case("xml") {
            ContentType::Xml
        } else if extension.eq_ignore_ascii_case("png") {
            ContentType::Png
        } else if extension.eq_ignore_ascii_case("jpg") || extension.eq_ignore_ascii_case("jpeg") {
            ContentType::Jpeg
        } else if extension.eq_ignore_ascii_case("txt") {
            ContentType::Plain
        } else {
            ContentType::OctetStream
        }
    }
}

/// An HTTP response, owned by the dispatcher until it has been written out.
///
/// The keep-alive flag is carried but currently unused: the connection always
/// closes after one response.
#[derive(Debug)]
pub struct Response {
    status: Status,
    content_type: ContentType,
    headers: Headers,
    body: Bytes,
    keep_alive: bool,
}

impl Response {
    pub fn new(status: Status, content_type: ContentType, body: impl Into<Bytes>) -> Self {
        Self { status, content_type, headers: Headers::new(), body: body.into(), keep_alive: false }
    }

    /// A `200 OK` HTML response.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Self::new(Status::Ok, ContentType::Html, body)
    }

    /// A `200 OK` plain-text response.
    pub fn text(body: impl Into<Bytes>) -> Self {
        Self::new(Status::Ok, ContentType::Plain, body)
    }

    /// A `200 OK` JSON response from an already serialized document.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::new(Status::Ok, ContentType::Json, body)
    }

    /// The standard HTML error page for a failed request.
    pub fn error_page(status: Status, message: &str) -> Self {
        let code = status.code();
        let body = format!(
            "<!DOCTYPE html>\n\
             <html><head><title>Error {code}</title></head>\n\
             <body>\n\
             <h1>Error {code}</h1>\n\
             <p>{message}</p>\n\
             <hr>\n\
             <small>lantern HTTP server</small>\n\
             </body></html>\n"
        );
        Self::new(status, ContentType::Html, body)
    }

    /// Appends a custom header; insertion order is preserved on the wire.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push(name, value);
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) {
        self.keep_alive = keep_alive;
    }

    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}
