//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use lantern_http::codec::DecodeLimits;

use crate::router::DEFAULT_ROUTE_CAPACITY;
use crate::security::DEFAULT_RATE_LIMIT_PER_MINUTE;
use crate::session::{DEFAULT_IDLE_TIMEOUT, DEFAULT_SESSION_CAPACITY};

/// Tunables for a [`crate::Server`].
///
/// The directories are conveniences for application handlers serving
/// templates and static files; the server itself never walks them.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub document_root: PathBuf,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,

    pub enable_websockets: bool,
    pub enable_security_headers: bool,
    /// Per-minute request budget per client address; `None` disables
    /// rate limiting.
    pub rate_limit_per_minute: Option<u32>,

    pub route_capacity: usize,
    pub session_capacity: usize,
    pub session_idle_timeout: Duration,

    pub decode_limits: DecodeLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            document_root: PathBuf::from("./www"),
            template_dir: PathBuf::from("./templates"),
            static_dir: PathBuf::from("./static"),
            enable_websockets: true,
            enable_security_headers: false,
            rate_limit_per_minute: None,
            route_capacity: DEFAULT_ROUTE_CAPACITY,
            session_capacity: DEFAULT_SESSION_CAPACITY,
            session_idle_timeout: DEFAULT_IDLE_TIMEOUT,
            decode_limits: DecodeLimits::default(),
        }
    }
}

impl ServerConfig {
    /// A config with rate limiting on at the default budget.
    pub fn with_rate_limiting() -> Self {
        Self { rate_limit_per_minute: Some(DEFAULT_RATE_LIMIT_PER_MINUTE), ..Self::default() }
    }
}
