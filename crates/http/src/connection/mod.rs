//! Connection lifecycle and dispatch.

mod http_connection;
pub use http_connection::HttpConnection;

mod stats;
pub use stats::ServerStats;
pub use stats::StatsSnapshot;
