//! The HTTP/1.x client protocol implementation
//!
mod client;
mod config;
mod encoder;
mod errors;
mod parser;
mod proto;
mod recv_mode;
mod simple;
pub mod buffered;

pub use self::errors::Error;
pub use self::client::{Client, Codec, BodyKind};
pub use self::encoder::{Encoder, EncoderDone, WaitFlush};
pub use self::proto::{Proto};
pub use self::simple::{fetch, pull};

use std::borrow::Cow;
use std::time::Duration;

use httparse::Header;

use {Version};

/// Fine-grained configuration of the HTTP connection
#[derive(Debug, Clone)]
pub struct Config {
    inflight_request_limit: usize,
    inflight_request_prealloc: usize,
    keep_alive_timeout: Duration,
    safe_pipeline_timeout: Duration,
    max_request_timeout: Duration,
}

/// A borrowed structure that represents response headers
///
/// It's passed to `Codec::headers_received` and you are free to store or
/// discard any needed fields and headers from it.
///
#[derive(Debug)]
pub struct Head<'a> {
    version: Version,
    code: u16,
    reason: &'a str,
    headers: &'a [Header<'a>],
    body_kind: BodyKind,
    connection_header: Option<Cow<'a, str>>,
    connection_close: bool,
}

/// Iterator over a response's raw `(name, value)` header pairs.
pub struct HeaderIter<'b, 'h: 'b> {
    headers: ::std::slice::Iter<'b, Header<'h>>,
}

impl<'b, 'h> Iterator for HeaderIter<'b, 'h> {
    type Item = (&'h str, &'h [u8]);
    fn next(&mut self) -> Option<Self::Item> {
        self.headers.next().map(|h| (h.name, h.value))
    }
}

impl<'a> Head<'a> {
    pub fn version(&self) -> Version { self.version }
    pub fn code(&self) -> u16 { self.code }
    pub fn reason(&self) -> &'a str { self.reason }
    pub fn headers(&self) -> &'a [Header<'a>] { self.headers }
    pub fn body_kind(&self) -> BodyKind { self.body_kind }
    pub fn connection_close(&self) -> bool { self.connection_close }
    pub fn iter(&self) -> HeaderIter<'_, 'a> {
        HeaderIter { headers: self.headers.iter() }
    }
}

/// This type is returned from `headers_received` handler of either
/// client client or server protocol handler
///
/// The marker is used to denote whether you want to have the whole request
/// buffered for you or read chunk by chunk.
///
/// The `Progressive` (chunk by chunk) mode is mostly useful for proxy servers.
/// Or it may be useful if your handler is able to parse data without holding
/// everything in the memory.
///
/// Otherwise, it's best to use `Buffered` mode (for example, comparing with
/// using your own buffering). We do our best to optimize it for you.
#[derive(Debug, Clone)]
pub struct RecvMode {
    mode: recv_mode::Mode,
}
