use std::io;
use std::fmt::Display;

use futures::{Future, Poll, Async};
use tk_bufstream::{WriteBuf, WriteRaw, FutureWriteRaw};
use tokio_io::AsyncWrite;

use base_serializer::{MessageState, HeaderError};
use enums::{Version, Status};
use super::headers::Head;

/// The response writer handed to `Codec::start_response`.
///
/// Methods ensure that everything written into the buffer is a
/// consistent, valid HTTP/1.1 message. It shares its state machine
/// (`MessageState`) with the client side via `base_serializer`.
pub struct Encoder<S> {
    state: MessageState,
    io: WriteBuf<S>,
}

/// Returned from `Encoder::done`; a continuation handed back to the
/// connection driver once a response is fully serialized.
pub struct EncoderDone<S> {
    buf: WriteBuf<S>,
}

/// Everything needed to start a response in the right frame (HEAD
/// suppression, whether the connection must close, the wire version).
#[derive(Debug, Clone, Copy)]
pub struct ResponseConfig {
    pub is_head: bool,
    pub do_close: bool,
    pub version: Version,
}

/// Future returned by `Encoder::raw_body()`, resolving to a `RawBody`
/// once the write buffer has drained.
pub struct FutureRawBody<S>(FutureWriteRaw<S>);

/// Future returned by `Encoder::wait_flush(x)`, resolving to the
/// `Encoder` again once fewer than `x` bytes remain buffered.
pub struct WaitFlush<S>(Option<Encoder<S>>, usize);

/// Zero-copy write handle for a response body, bypassing `MessageState`
/// bookkeeping. The caller is responsible for writing exactly
/// `Content-Length` bytes.
pub struct RawBody<S> {
    io: WriteRaw<S>,
}

impl<S> Encoder<S> {
    /// Write a 100 (Continue) interim response.
    pub fn response_continue(&mut self) {
        self.state.response_continue(&mut self.io.out_buf)
    }

    /// Write the status line using the `Status` enum.
    pub fn status(&mut self, status: Status) {
        self.state.response_status(&mut self.io.out_buf,
            status.code(), status.reason())
    }

    /// Write a custom status line.
    pub fn custom_status(&mut self, code: u16, reason: &str) {
        self.state.response_status(&mut self.io.out_buf, code, reason)
    }

    /// Add a header. `Content-Length` and `Transfer-Encoding` must go
    /// through `add_length`/`add_chunked` instead.
    pub fn add_header<V: AsRef<[u8]>>(&mut self, name: &str, value: V)
        -> Result<(), HeaderError>
    {
        self.state.add_header(&mut self.io.out_buf, name, value.as_ref())
    }

    /// Like `add_header` but formats the value directly into the
    /// buffer; useful for dates and numeric headers.
    pub fn format_header<D: Display>(&mut self, name: &str, value: D)
        -> Result<(), HeaderError>
    {
        self.state.format_header(&mut self.io.out_buf, name, value)
    }

    /// Add `Content-Length: n`.
    pub fn add_length(&mut self, n: u64) -> Result<(), HeaderError> {
        self.state.add_length(&mut self.io.out_buf, n)
    }

    /// Switch to `Transfer-Encoding: chunked`.
    pub fn add_chunked(&mut self) -> Result<(), HeaderError> {
        self.state.add_chunked(&mut self.io.out_buf)
    }

    /// Add a `Date` header stamped with the current time.
    #[cfg(feature = "date_header")]
    pub fn add_date(&mut self) {
        use httpdate::HttpDate;
        use std::time::SystemTime;
        self.format_header("Date", HttpDate::from(SystemTime::now()))
            .expect("always valid to add a date")
    }

    /// `true` once `status()`/`custom_status()` has been called.
    pub fn is_started(&self) -> bool {
        self.state.is_started()
    }

    /// Closes the header block; returns whether a body is expected.
    pub fn done_headers(&mut self) -> Result<bool, HeaderError> {
        self.state.done_headers(&mut self.io.out_buf)
    }

    /// Write (or buffer) a chunk of the response body.
    pub fn write_body(&mut self, data: &[u8]) {
        self.state.write_body(&mut self.io.out_buf, data)
    }

    /// `true` once `done()` has been called.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Finalize the message.
    pub fn done(mut self) -> EncoderDone<S> {
        self.state.done(&mut self.io.out_buf);
        EncoderDone { buf: self.io }
    }

    /// Returns true once headers are written, whether or not the body
    /// is complete -- the point past which a retrofitted error page is
    /// no longer possible.
    pub fn is_after_headers(&self) -> bool {
        self.state.is_after_headers()
    }

    /// A raw, unframed write handle for zero-copy bodies. Panics unless
    /// headers have already been written.
    pub fn raw_body(self) -> FutureRawBody<S> {
        assert!(self.state.is_after_headers());
        FutureRawBody(self.io.borrow_raw())
    }

    /// Flush buffered bytes to the socket; schedules a wakeup if the
    /// socket isn't ready.
    pub fn flush(&mut self) -> Result<(), io::Error>
        where S: AsyncWrite
    {
        self.io.flush()
    }

    /// Bytes currently sitting in the write buffer (may include bytes
    /// left over from a pipelined previous response).
    pub fn bytes_buffered(&mut self) -> usize {
        self.io.out_buf.len()
    }

    /// Future yielding the `Encoder` back once fewer than `watermark`
    /// bytes remain buffered -- the writer's back-pressure primitive: a
    /// slow socket stalls producer calls instead of buffering without
    /// bound.
    pub fn wait_flush(self, watermark: usize) -> WaitFlush<S> {
        WaitFlush(Some(self), watermark)
    }
}

impl<S> RawBody<S> {
    pub fn done(self) -> EncoderDone<S> {
        EncoderDone { buf: self.io.into_buf() }
    }
}

impl<S> io::Write for Encoder<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_body(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

impl<S: AsyncWrite> AsyncWrite for Encoder<S> {
    fn shutdown(&mut self) -> Poll<(), io::Error> {
        panic!("can't shutdown a response encoder directly");
    }
}

impl<S: AsyncWrite> io::Write for RawBody<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.io.get_mut().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.io.get_mut().flush()
    }
}

impl<S: AsyncWrite> AsyncWrite for RawBody<S> {
    fn shutdown(&mut self) -> Poll<(), io::Error> {
        panic!("can't shutdown a response body directly");
    }
}

pub fn get_inner<S>(e: EncoderDone<S>) -> WriteBuf<S> {
    e.buf
}

pub fn new<S>(io: WriteBuf<S>, cfg: ResponseConfig) -> Encoder<S> {
    use base_serializer::Body::*;
    Encoder {
        state: MessageState::ResponseStart {
            body: if cfg.is_head { Head } else { Normal },
            version: cfg.version,
            close: cfg.do_close || cfg.version == Version::Http10,
        },
        io: io,
    }
}

impl ResponseConfig {
    pub fn from(req: &Head<'_>) -> ResponseConfig {
        ResponseConfig {
            version: req.version(),
            is_head: req.method() == "HEAD",
            do_close: req.connection_close(),
        }
    }
}

impl<S: AsyncWrite> Future for FutureRawBody<S> {
    type Item = RawBody<S>;
    type Error = io::Error;
    fn poll(&mut self) -> Poll<RawBody<S>, io::Error> {
        self.0.poll().map(|x| x.map(|y| RawBody { io: y }))
    }
}

impl<S: AsyncWrite> Future for WaitFlush<S> {
    type Item = Encoder<S>;
    type Error = io::Error;
    fn poll(&mut self) -> Result<Async<Encoder<S>>, io::Error> {
        let bytes_left = {
            let enc = self.0.as_mut().expect("future is polled twice");
            enc.flush()?;
            enc.io.out_buf.len()
        };
        if bytes_left < self.1 {
            Ok(Async::Ready(self.0.take().unwrap()))
        } else {
            Ok(Async::NotReady)
        }
    }
}

/// Write an entire memory-mapped file as a response body in one shot.
///
/// Equivalent to calling `write_body` with the whole mapping, but spelled
/// out separately so callers serving from `FileCache` don't need to
/// reason about chunk boundaries: the mapping already lives in memory,
/// so there's no streaming to do.
pub fn write_mapped_body<S>(enc: &mut Encoder<S>, mapping: &[u8]) {
    enc.write_body(mapping);
}

#[cfg(test)]
mod test {
    use tk_bufstream::{MockData, IoBuf};
    use Status;

    use base_serializer::{MessageState, Body};
    use super::{Encoder, EncoderDone};
    use enums::Version;

    fn do_response11_str<F>(fun: F) -> String
        where F: FnOnce(Encoder<MockData>) -> EncoderDone<MockData>
    {
        let mock = MockData::new();
        let done = fun(Encoder {
                state: MessageState::ResponseStart {
                    body: Body::Normal,
                    version: Version::Http11,
                    close: false,
                },
                io: IoBuf::new(mock.clone()).split().0,
            });
        { done }.buf.flush().unwrap();
        String::from_utf8_lossy(&mock.output(..)).to_string()
    }

    #[test]
    fn date_header() {
        assert!(do_response11_str(|mut enc| {
                enc.status(Status::Ok);
                enc.add_date();
                enc.add_length(0).unwrap();
                enc.done_headers().unwrap();
                enc.done()
            }).starts_with("HTTP/1.1 200 OK\r\nDate: "));
    }

    #[test]
    fn chunked_body() {
        assert_eq!(do_response11_str(|mut enc| {
                enc.status(Status::Ok);
                enc.add_chunked().unwrap();
                enc.done_headers().unwrap();
                enc.write_body(b"hello");
                enc.done()
            }),
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
             5\r\nhello\r\n0\r\n\r\n");
    }
}
