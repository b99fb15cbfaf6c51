//! The per-connection driver: reads request lines/headers/body off the
//! socket, dispatches to a `Dispatcher`/`Codec` pair, and pumps their
//! response back out.
//!
//! Drives the connection as a single `Future` (rather than a
//! `Stream`+`Sink` pair), alternating `do_reads`/`do_writes` until
//! neither makes progress.
use std::collections::VecDeque;
use std::sync::Arc;

use futures::{Future, Poll, Async};
use httparse;
use tk_bufstream::{IoBuf, WriteBuf, ReadBuf};
use tokio_io::{AsyncRead, AsyncWrite};

use OptFuture;
use enums::Version;
use super::codec::BodyKind;
use super::encoder::{self, get_inner, ResponseConfig};
use super::headers::scan_headers;
use super::recv_mode;
use super::{Codec, Dispatcher, Error, EncoderDone, Config, RecvMode};

const MAX_HEADERS: usize = 64;

enum OutState<S> {
    Idle(WriteBuf<S>),
    Write(OptFuture<EncoderDone<S>, Error>),
    Void,
}

#[derive(Debug, Clone)]
enum BodyProgress {
    Fixed(u64),
    Chunked(::chunked::State),
}

enum InState<S, C> {
    Headers,
    Body { codec: C, is_head: bool, progress: BodyProgress, do_close: bool, phantom: ::std::marker::PhantomData<S> },
    WaitingForResponse,
    Void,
}

/// A low-level HTTP/1.x server protocol handler.
///
/// Drives a single accepted connection: parses requests off `inbuf`,
/// hands each one to `D::Codec` via `Dispatcher::headers_received`, and
/// serializes responses back onto `outbuf` in request order.
pub struct Proto<S, D: Dispatcher<S>> {
    dispatcher: D,
    inbuf: ReadBuf<S>,
    reading: InState<S, D::Codec>,
    waiting: VecDeque<(bool, D::Codec)>,
    writing: OutState<S>,
    config: Arc<Config>,
    close_after_last: bool,
}

impl<S, D: Dispatcher<S>> Proto<S, D> {
    /// Create a new protocol driver over an accepted connection.
    pub fn new(conn: S, dispatcher: D, cfg: &Arc<Config>) -> Proto<S, D> {
        let (cout, cin) = IoBuf::new(conn).split();
        Proto {
            dispatcher: dispatcher,
            inbuf: cin,
            reading: InState::Headers,
            waiting: VecDeque::with_capacity(cfg.inflight_request_prealloc),
            writing: OutState::Idle(cout),
            config: cfg.clone(),
            close_after_last: false,
        }
    }
}

impl<S: AsyncRead + AsyncWrite, D: Dispatcher<S>> Proto<S, D> {
    /// Try to parse and dispatch as much of the input buffer as possible.
    /// Returns `true` if progress was made (so the caller should try
    /// `do_writes` again).
    fn do_reads(&mut self) -> Result<bool, Error> {
        if self.waiting.len() >= self.config.inflight_request_limit {
            // Keep parsing off the socket so the TCP window doesn't
            // stall, but hold completed requests before dispatching
            // more than the configured number at once.
            return Ok(false);
        }
        match self.reading {
            InState::Headers => self.parse_headers(),
            InState::Body { .. } => self.feed_body(),
            InState::WaitingForResponse | InState::Void => Ok(false),
        }
    }

    fn parse_headers(&mut self) -> Result<bool, Error> {
        self.inbuf.read()?;
        let mut storage = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut parser = httparse::Request::new(&mut storage);
        let status = {
            let buf: &[u8] = &self.inbuf.in_buf[..];
            parser.parse(buf)?
        };
        let bytes = match status {
            httparse::Status::Complete(n) => n,
            httparse::Status::Partial => return Ok(false),
        };
        let version = if parser.version == Some(1) {
            Version::Http11
        } else {
            Version::Http10
        };
        let head = scan_headers(&parser, version)?;
        let close = head.connection_close();
        let body_kind = head.body_kind();
        let is_head = head.method() == "HEAD";
        let mut codec = self.dispatcher.headers_received(&head)?;
        let mode = codec.recv_mode();
        let progress = if recv_mode::get_mode(&mode) == recv_mode::Mode::Hijack {
            None
        } else {
            Some(match body_kind {
                BodyKind::Chunked => BodyProgress::Chunked(::chunked::State::new()),
                BodyKind::Fixed(n) => BodyProgress::Fixed(n),
            })
        };
        self.inbuf.in_buf.remove_range(0..bytes);
        if close {
            self.close_after_last = true;
        }
        match progress {
            Some(progress) => {
                self.reading = InState::Body {
                    codec: codec,
                    is_head: is_head,
                    progress: progress,
                    do_close: close,
                    phantom: ::std::marker::PhantomData,
                };
            }
            None => {
                self.waiting.push_back((is_head, codec));
                self.reading = InState::Headers;
            }
        }
        Ok(true)
    }

    fn feed_body(&mut self) -> Result<bool, Error> {
        self.inbuf.read()?;
        let (done, consumed) = match self.reading {
            InState::Body { ref mut codec, ref mut progress, .. } => {
                match progress {
                    &mut BodyProgress::Fixed(ref mut left) => {
                        let avail = self.inbuf.in_buf.len().min(*left as usize);
                        if avail == 0 && *left > 0 {
                            return Ok(false);
                        }
                        let end = *left as usize == avail;
                        let n = codec.data_received(
                            &self.inbuf.in_buf[..avail], end)?;
                        let n = match n {
                            Async::Ready(n) => n,
                            Async::NotReady => return Ok(false),
                        };
                        *left -= n as u64;
                        (end && n == avail, n)
                    }
                    &mut BodyProgress::Chunked(ref mut state) => {
                        state.parse(&mut self.inbuf.in_buf)?;
                        let avail = state.buffered();
                        let end = state.is_done();
                        if avail == 0 && !end {
                            return Ok(false);
                        }
                        let n = codec.data_received(
                            &self.inbuf.in_buf[..avail], end)?;
                        let n = match n {
                            Async::Ready(n) => n,
                            Async::NotReady => return Ok(false),
                        };
                        state.consume(n);
                        (end && n == avail, n)
                    }
                }
            }
            _ => unreachable!(),
        };
        self.inbuf.in_buf.remove_range(0..consumed);
        if done {
            let old = ::std::mem::replace(&mut self.reading, InState::Headers);
            if let InState::Body { codec, is_head, .. } = old {
                self.waiting.push_back((is_head, codec));
            }
        }
        Ok(true)
    }

    fn do_writes(&mut self) -> Poll<(), Error> {
        loop {
            let old = ::std::mem::replace(&mut self.writing, OutState::Void);
            self.writing = match old {
                OutState::Idle(mut io) => {
                    io.flush()?;
                    match self.waiting.pop_front() {
                        Some((is_head, mut codec)) => {
                            let cfg = ResponseConfig {
                                is_head: is_head,
                                do_close: self.close_after_last,
                                version: Version::Http11,
                            };
                            let enc = encoder::new(io, cfg);
                            OutState::Write(codec.start_response(enc))
                        }
                        None => OutState::Idle(io),
                    }
                }
                OutState::Write(mut fut) => {
                    match fut.poll()? {
                        Async::Ready(done) => {
                            OutState::Idle(get_inner(done))
                        }
                        Async::NotReady => {
                            self.writing = OutState::Write(fut);
                            return Ok(Async::NotReady);
                        }
                    }
                }
                OutState::Void => unreachable!(),
            };
            if let OutState::Idle(_) = self.writing {
                if self.waiting.is_empty() {
                    return Ok(Async::NotReady);
                }
            }
        }
    }
}

impl<S: AsyncRead + AsyncWrite, D: Dispatcher<S>> Future for Proto<S, D> {
    type Item = ();
    type Error = Error;

    fn poll(&mut self) -> Poll<(), Error> {
        self.do_writes()?;
        while self.do_reads()? {
            self.do_writes()?;
        }
        Ok(Async::NotReady)
    }
}
