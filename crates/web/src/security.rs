//! Security policy helpers: response hardening headers, per-client rate
//! limiting and CSRF tokens.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::warn;

use lantern_http::protocol::{Request, Response};

pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 60;
pub const CSRF_TOKEN_LEN: usize = 32;

/// Adds the standard hardening headers to a response.
pub fn add_security_headers(response: &mut Response) {
    response.add_header("X-Content-Type-Options", "nosniff");
    response.add_header("X-Frame-Options", "DENY");
    response.add_header("X-XSS-Protection", "1; mode=block");
    response.add_header("Referrer-Policy", "strict-origin-when-cross-origin");
}

/// Fixed-window request counter keyed by client id.
#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    windows: Mutex<HashMap<String, Window>>,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_RATE_LIMIT_PER_MINUTE)
    }

    pub fn with_limit(limit: u32) -> Self {
        Self { limit, windows: Mutex::new(HashMap::new()) }
    }

    /// Counts one request for `client_id` and reports whether it is still
    /// within the per-minute limit.
    pub fn check(&self, client_id: &str) -> bool {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        let window = windows
            .entry(client_id.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.duration_since(window.started) >= Duration::from_secs(60) {
            window.started = now;
            window.count = 0;
        }

        window.count += 1;
        let allowed = window.count <= self.limit;
        if !allowed {
            warn!(client_id, count = window.count, limit = self.limit, "rate limit exceeded");
        }
        allowed
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// A random alphanumeric token.
pub(crate) fn random_token(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

/// Generates a CSRF token for a form or API client.
pub fn generate_csrf_token() -> String {
    random_token(CSRF_TOKEN_LEN)
}

/// Validates the CSRF token a request carries — `X-CSRF-Token` header first,
/// `csrf_token` query parameter as fallback.
pub fn validate_csrf_token(request: &Request, expected: &str) -> bool {
    request
        .header("X-CSRF-Token")
        .or_else(|| request.query_param("csrf_token"))
        .is_some_and(|token| token == expected)
}
