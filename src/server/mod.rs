//! HTTP server: router, static file cache, and the per-connection
//! request/response state machine.
mod config;
mod error;
mod codec;
pub mod encoder;
mod proto;
mod request_target;
mod headers;
mod recv_mode;
mod mime;
mod router;
mod file_cache;
mod simple_error_page;
mod static_files;
pub mod buffered;

pub use self::error::Error;
pub use self::encoder::{Encoder, EncoderDone, FutureRawBody, RawBody};
pub use self::codec::{Codec, Dispatcher, Head, BodyKind};
pub use self::headers::HeaderIter;
pub use self::proto::Proto;
pub use self::request_target::RequestTarget;
pub use self::router::{Router, Route, Lambda};
pub use self::file_cache::{FileCache, CachedFile, Lookup as FileLookup,
    CacheRemover, EvictionTask, remote_removable};
pub use self::buffered::{BufferedDispatcher, Request};
pub use self::recv_mode::RecvMode;
pub use self::static_files::{StaticFiles, serve_file, serve_stream};

use std::time::Duration;

/// Fine-grained configuration of the HTTP server.
///
/// Ambient logging configuration is left to the embedding application's
/// `log` backend, as usual.
#[derive(Debug, Clone)]
pub struct Config {
    inflight_request_limit: usize,
    inflight_request_prealloc: usize,
    buffer_baseline: usize,
    max_request_body: u64,
    listen_backlog: i32,
    tcp_keepalive: Duration,
}
