use futures::Async;
use tokio_core::io::Io;

use super::{Error, Encoder, EncoderDone};
use super::headers;
use OptFuture;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Fixed(u64),
    Chunked,
}

/// Borrowed request headers, as passed to `Dispatcher::headers_received`.
///
/// Note we don't strip hop-by-hop headers (`Connection`,
/// `Transfer-Encoding`); we use them ourselves to ensure correctness of
/// the protocol. Strip them yourself if proxying headers elsewhere.
pub type Head<'a> = headers::Head<'a>;

/// This is a low-level interface to the http server
pub trait Dispatcher<S: Io> {
    type Codec: Codec<S>;

    /// Received headers of a request.
    ///
    /// At this point we've already extracted everything we need to
    /// ensure correctness of the protocol. If you need some of the
    /// headers later, store them on `Self::Codec` now.
    fn headers_received(&mut self, headers: &Head<'_>) -> Result<Self::Codec, Error>;
}

pub trait Codec<S: Io> {
    /// Return a mode which will be used to receive the request body.
    ///
    /// Called once, right after `headers_received`.
    fn recv_mode(&mut self) -> super::RecvMode;

    /// Chunk of the request body received. `end` is `true` for the
    /// final chunk.
    ///
    /// Returns the number of bytes consumed; leftover bytes are passed
    /// again on the next call. Protocol panics if the returned count
    /// exceeds `data.len()`.
    fn data_received(&mut self, data: &[u8], end: bool)
        -> Result<Async<usize>, Error>;

    /// Start writing a response.
    ///
    /// Called once all preceding responses on this connection have
    /// either been sent or buffered. May be called before
    /// `data_received` returns its last chunk, but never before
    /// `headers_received`.
    fn start_response(&mut self, e: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>;
}
