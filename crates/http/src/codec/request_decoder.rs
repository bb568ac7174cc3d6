//! HTTP request decoder.
//!
//! Decoding runs as a two-phase state machine implementing the
//! [`Decoder`] trait:
//!
//! 1. **Head**: bytes accumulate until the blank-line terminator, then the
//!    request line, query string, headers and session cookie are parsed in
//!    one pass.
//! 2. **Body**: when `Content-Length` announces a usable body, exactly that
//!    many bytes are collected across as many reads as needed.
//!
//! Failure semantics are deliberately two-tiered: a broken request line or
//! an oversized head abort the request, while over-cap headers and short
//! body reads degrade without failing (the first entries are honored, the
//! partial body is kept).

use std::mem;
use std::time::SystemTime;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::ensure;
use crate::protocol::{Headers, Method, ParseError, Request};

/// Caps applied while decoding a single request.
///
/// `max_headers` and `max_query_params` truncate (the first N entries are
/// honored); `max_head_bytes` is fatal; bodies whose declared length falls
/// outside `(0, max_body_bytes)` are skipped rather than read.
#[derive(Debug, Clone)]
pub struct DecodeLimits {
    pub max_head_bytes: usize,
    pub max_headers: usize,
    pub max_query_params: usize,
    pub max_body_bytes: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_head_bytes: 16 * 1024,
            max_headers: 32,
            max_query_params: 32,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// A decoder for HTTP requests that assembles a complete [`Request`].
pub struct RequestDecoder {
    limits: DecodeLimits,
    state: DecodeState,
}

enum DecodeState {
    Head,
    Body { request: Request, needed: usize },
}

impl RequestDecoder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self { limits, state: DecodeState::Head }
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_limits(DecodeLimits::default())
    }
}

impl Decoder for RequestDecoder {
    type Item = Request;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match mem::replace(&mut self.state, DecodeState::Head) {
                DecodeState::Head => {
                    let Some(head_end) = find_head_end(src) else {
                        ensure!(
                            src.len() <= self.limits.max_head_bytes,
                            ParseError::head_too_large(src.len(), self.limits.max_head_bytes)
                        );
                        return Ok(None);
                    };
                    ensure!(
                        head_end + 4 <= self.limits.max_head_bytes,
                        ParseError::head_too_large(head_end + 4, self.limits.max_head_bytes)
                    );

                    let head = src.split_to(head_end + 4);
                    let (request, body_len) = parse_head(&head[..head_end + 2], &self.limits)?;
                    trace!(
                        method = %request.method(),
                        path = request.path(),
                        headers = request.headers().len(),
                        body_len,
                        "parsed request head"
                    );

                    match body_len {
                        Some(needed) => {
                            self.state = DecodeState::Body { request, needed };
                        }
                        None => return Ok(Some(request)),
                    }
                }

                DecodeState::Body { mut request, needed } => {
                    if src.len() < needed {
                        self.state = DecodeState::Body { request, needed };
                        return Ok(None);
                    }
                    request.set_body(src.split_to(needed).freeze());
                    return Ok(Some(request));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(request) = self.decode(src)? {
            return Ok(Some(request));
        }

        match mem::replace(&mut self.state, DecodeState::Head) {
            // Connection closed before the declared body arrived: keep what
            // was received instead of failing the request.
            DecodeState::Body { mut request, needed } => {
                warn!(
                    expected = needed,
                    available = src.len(),
                    "connection closed before full body, keeping partial read"
                );
                let available = src.len();
                request.set_body(src.split_to(available).freeze());
                Ok(Some(request))
            }
            DecodeState::Head => {
                if src.is_empty() {
                    Ok(None)
                } else {
                    Err(ParseError::malformed("connection closed before header terminator"))
                }
            }
        }
    }
}

fn find_head_end(src: &[u8]) -> Option<usize> {
    src.windows(4).position(|window| window == b"\r\n\r\n")
}

/// Parses everything up to (and including) the final header CRLF.
///
/// Returns the request plus the usable body length announced by
/// `Content-Length`, if any.
fn parse_head(head: &[u8], limits: &DecodeLimits) -> Result<(Request, Option<usize>), ParseError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| ParseError::malformed("head contains invalid utf-8"))?;

    let mut lines = text.split("\r\n");
    let request_line = lines.next().unwrap_or_default();

    let mut tokens = request_line.split_whitespace();
    let (method_token, target, version) =
        match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(method), Some(target), Some(version), None) => (method, target, version),
            _ => {
                return Err(ParseError::malformed(format!(
                    "expected 3 tokens, got {request_line:?}"
                )));
            }
        };

    let method = Method::from_token(method_token);
    ensure!(method != Method::Unknown, ParseError::unknown_method(method_token));

    let (path, raw_query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };
    let query = raw_query.map(|q| parse_query(q, limits.max_query_params)).unwrap_or_default();

    let mut headers = Headers::new();
    let mut truncated = false;
    for line in lines {
        if line.is_empty() {
            break;
        }
        if headers.len() == limits.max_headers {
            truncated = true;
            continue;
        }
        // Lines without a colon are skipped rather than rejected.
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        headers.push(name, value.trim_start_matches([' ', '\t']));
    }
    if truncated {
        warn!(max = limits.max_headers, "header cap reached, honoring the first entries only");
    }

    let body_len = headers
        .get("Content-Length")
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|len| *len > 0 && *len < limits.max_body_bytes);

    let session_id = headers.get("Cookie").and_then(session_from_cookie);

    let request = Request::from_parts(
        method,
        path.to_string(),
        version.to_string(),
        query,
        headers,
        session_id,
        SystemTime::now(),
    );

    Ok((request, body_len))
}

fn parse_query(raw: &str, max_params: usize) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for pair in raw.split('&') {
        if params.len() == max_params {
            warn!(max = max_params, "query parameter cap reached, honoring the first entries only");
            break;
        }
        // Pairs without '=' are dropped.
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        params.push((name.to_string(), value.to_string()));
    }
    params
}

fn session_from_cookie(cookie: &str) -> Option<String> {
    let start = cookie.find("session_id=")? + "session_id=".len();
    let rest = &cookie[start..];
    let end = rest.find(';').unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(raw: &str) -> Result<Option<Request>, ParseError> {
        let mut buf = BytesMut::from(raw);
        RequestDecoder::new().decode(&mut buf)
    }

    #[test]
    fn simple_get() {
        let request = decode_all(
            "GET /index.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nAccept: */*\r\n\r\n",
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/index.html");
        assert_eq!(request.version(), "HTTP/1.1");
        assert_eq!(request.header("host"), Some("127.0.0.1:8080"));
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.body(), None);
        assert!(request.session_id().is_none());
    }

    #[test]
    fn query_string_splits_on_first_equals() {
        let request = decode_all(
            "GET /search?q=a=b&lang=en&debug&lang=de HTTP/1.1\r\n\r\n",
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.path(), "/search");
        // value keeps everything after the first '='
        assert_eq!(request.query_param("q"), Some("a=b"));
        // duplicates resolve to the first occurrence, '='-less pairs drop
        assert_eq!(request.query_param("lang"), Some("en"));
        assert_eq!(request.query_param("debug"), None);
        assert_eq!(request.query_params().len(), 3);
    }

    #[test]
    fn query_values_stay_percent_encoded() {
        let request = decode_all("GET /greet?name=John%20Doe HTTP/1.1\r\n\r\n").unwrap().unwrap();
        assert_eq!(request.query_param("name"), Some("John%20Doe"));
    }

    #[test]
    fn body_read_with_content_length() {
        let request = decode_all(
            "POST /upload HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello world",
        )
        .unwrap()
        .unwrap();

        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.body(), Some(&b"hello world"[..]));
        assert_eq!(request.body_len(), 11);
    }

    #[test]
    fn body_arrives_across_reads() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\n12345");

        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b"67890");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.body(), Some(&b"1234567890"[..]));
    }

    #[test]
    fn short_body_kept_at_eof() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc");

        assert!(decoder.decode(&mut buf).unwrap().is_none());
        let request = decoder.decode_eof(&mut buf).unwrap().unwrap();
        assert_eq!(request.body(), Some(&b"abc"[..]));
    }

    #[test]
    fn oversized_content_length_skips_body() {
        let request = decode_all(
            "POST / HTTP/1.1\r\nContent-Length: 99999999999\r\n\r\n",
        )
        .unwrap()
        .unwrap();
        assert_eq!(request.body(), None);
    }

    #[test]
    fn unparsable_content_length_skips_body() {
        let request =
            decode_all("POST / HTTP/1.1\r\nContent-Length: twelve\r\n\r\n").unwrap().unwrap();
        assert_eq!(request.body(), None);
    }

    #[test]
    fn request_line_needs_three_tokens() {
        let result = decode_all("GET /index.html\r\n\r\n");
        assert!(matches!(result, Err(ParseError::MalformedRequestLine { .. })));

        let result = decode_all("GET /a b HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(ParseError::MalformedRequestLine { .. })));
    }

    #[test]
    fn lowercase_method_is_rejected() {
        let result = decode_all("get / HTTP/1.1\r\n\r\n");
        assert!(matches!(result, Err(ParseError::UnknownMethod { .. })));
    }

    #[test]
    fn incomplete_head_waits_for_more() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET / HTTP/1.1\r\nHost: example");
        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b".com\r\n\r\n");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.header("Host"), Some("example.com"));
    }

    #[test]
    fn truncated_head_at_eof_is_malformed() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET / HTTP");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
        let result = decoder.decode_eof(&mut buf);
        assert!(matches!(result, Err(ParseError::MalformedRequestLine { .. })));
    }

    #[test]
    fn headers_truncate_at_cap() {
        let mut raw = String::from("GET / HTTP/1.1\r\n");
        for i in 0..40 {
            raw.push_str(&format!("X-Header-{i}: {i}\r\n"));
        }
        raw.push_str("\r\n");

        let request = decode_all(&raw).unwrap().unwrap();
        assert_eq!(request.headers().len(), 32);
        assert_eq!(request.header("X-Header-0"), Some("0"));
        assert_eq!(request.header("X-Header-31"), Some("31"));
        assert_eq!(request.header("X-Header-32"), None);
    }

    #[test]
    fn query_params_truncate_at_cap() {
        let pairs: Vec<String> = (0..40).map(|i| format!("p{i}={i}")).collect();
        let raw = format!("GET /?{} HTTP/1.1\r\n\r\n", pairs.join("&"));

        let request = decode_all(&raw).unwrap().unwrap();
        assert_eq!(request.query_params().len(), 32);
        assert_eq!(request.query_param("p31"), Some("31"));
        assert_eq!(request.query_param("p32"), None);
    }

    #[test]
    fn header_without_colon_is_skipped() {
        let request = decode_all(
            "GET / HTTP/1.1\r\nValid: yes\r\nbogus line\r\nAlso-Valid: yes\r\n\r\n",
        )
        .unwrap()
        .unwrap();
        assert_eq!(request.headers().len(), 2);
        assert_eq!(request.header("Also-Valid"), Some("yes"));
    }

    #[test]
    fn header_value_leading_whitespace_trimmed() {
        let request =
            decode_all("GET / HTTP/1.1\r\nX-Padded: \t  value  \r\n\r\n").unwrap().unwrap();
        assert_eq!(request.header("X-Padded"), Some("value  "));
    }

    #[test]
    fn session_cookie_extraction() {
        let request = decode_all(
            "GET / HTTP/1.1\r\nCookie: theme=dark; session_id=abc123; lang=en\r\n\r\n",
        )
        .unwrap()
        .unwrap();
        assert_eq!(request.session_id(), Some("abc123"));

        let request = decode_all("GET / HTTP/1.1\r\nCookie: session_id=tail\r\n\r\n")
            .unwrap()
            .unwrap();
        assert_eq!(request.session_id(), Some("tail"));

        let request =
            decode_all("GET / HTTP/1.1\r\nCookie: theme=dark\r\n\r\n").unwrap().unwrap();
        assert_eq!(request.session_id(), None);
    }

    #[test]
    fn oversized_head_is_rejected() {
        let limits = DecodeLimits { max_head_bytes: 64, ..DecodeLimits::default() };
        let mut decoder = RequestDecoder::with_limits(limits);
        let mut buf = BytesMut::from(
            format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(100)).as_str(),
        );
        let result = decoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::HeadTooLarge { .. })));
    }

    #[test]
    fn leftover_bytes_stay_in_buffer() {
        let mut decoder = RequestDecoder::new();
        let mut buf =
            BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nbodyEXTRA");
        let request = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(request.body(), Some(&b"body"[..]));
        assert_eq!(&buf[..], b"EXTRA");
    }
}
