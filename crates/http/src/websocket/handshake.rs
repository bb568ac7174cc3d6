//! WebSocket upgrade detection and handshake.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use sha1::{Digest, Sha1};

use crate::protocol::Request;

/// The RFC 6455 handshake GUID appended to the client key.
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Returns true when a request qualifies as a WebSocket upgrade:
/// `Connection` contains `upgrade`, `Upgrade` equals `websocket` (both
/// case-insensitive), `Sec-WebSocket-Version` is `13` and a non-empty
/// `Sec-WebSocket-Key` is present.
pub fn is_upgrade_request(request: &Request) -> bool {
    let connection_upgrades = request
        .header("Connection")
        .is_some_and(|value| value.to_ascii_lowercase().contains("upgrade"));
    let upgrade_is_websocket = request
        .header("Upgrade")
        .is_some_and(|value| value.eq_ignore_ascii_case("websocket"));
    let version_matches = request.header("Sec-WebSocket-Version") == Some("13");
    let has_key = request.header("Sec-WebSocket-Key").is_some_and(|key| !key.is_empty());

    connection_upgrades && upgrade_is_websocket && version_matches && has_key
}

/// Derives the `Sec-WebSocket-Accept` value:
/// `base64(SHA1(key + GUID))`.
pub fn accept_key(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    STANDARD.encode(hasher.finalize())
}

/// The raw `101 Switching Protocols` response, ready to write to the stream.
pub fn handshake_response(key: &str) -> Bytes {
    Bytes::from(format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n\
         \r\n",
        accept_key(key)
    ))
}
