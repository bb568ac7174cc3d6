//! Wire codecs for the HTTP protocol layer.
//!
//! [`RequestDecoder`] and [`ResponseEncoder`] implement the
//! [`tokio_util::codec`] traits so the connection layer can drive them
//! through `FramedRead`/`FramedWrite`. Both are pure and connection-local:
//! they can run concurrently on independent connections without any shared
//! state.

mod request_decoder;
pub use request_decoder::DecodeLimits;
pub use request_decoder::RequestDecoder;

mod response_encoder;
pub use response_encoder::ResponseEncoder;
