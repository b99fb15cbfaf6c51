use futures::sink::Sink;
use futures::Async;
use tokio_core::io::Io;

use client::{Error, Encoder, EncoderDone, Head, RecvMode};
use {OptFuture};


#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Fixed(u64),
    Chunked,
    Eof,
}

pub trait Codec<S: Io> {

    fn start_write(&mut self, e: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>;

    fn headers_received(&mut self, headers: &Head<'_>) -> Result<RecvMode, Error>;

    /// Chunk of the response body received
    ///
    /// `end` equals to `true` for the last chunk of the data.
    ///
    /// Method returns `Async::Ready(x)` to denote that it has consumed `x`
    /// bytes. If there are some bytes left in the buffer they will be passed
    /// again on the call.
    ///
    /// If the response is empty, or last chunk arrives later and it's empty
    /// we call `c.data_received(b"", true)` on every wakeup,
    /// until `Async::Ready(0)` is returned (this helps to drive future that
    /// might complete on request completion without spawning another ones,
    /// but note that next request can't start reading in the meantime).
    ///
    /// Protocol panics if returned number of bytes larger than `data.len()`.
    ///
    fn data_received(&mut self, data: &[u8], end: bool)
        -> Result<Async<usize>, Error>;
}


pub trait Client<C: Codec<S>, S: Io>: Sink<SinkItem=C, SinkError=Error> {
}
