extern crate futures;
extern crate loom_http;
extern crate tk_bufstream;

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use futures::{Future, Async};
use tk_bufstream::MockData;

use loom_http::OptFuture;
use loom_http::server::{Proto, Config, Dispatcher, Codec, BodyKind};
use loom_http::server::{Head, RecvMode, Error, Encoder, EncoderDone};

#[derive(Debug, Default, Clone)]
struct Seen {
    method: String,
    path: String,
    host: Option<String>,
    body_kind: Option<BodyKind>,
    connection_close: bool,
}

struct RecordingDisp(Rc<RefCell<Option<Seen>>>);

struct RecordingCodec;

impl Dispatcher<MockData> for RecordingDisp {
    type Codec = RecordingCodec;
    fn headers_received(&mut self, headers: &Head<'_>)
        -> Result<Self::Codec, Error>
    {
        *self.0.borrow_mut() = Some(Seen {
            method: headers.method().to_string(),
            path: headers.path().to_string(),
            host: headers.host().map(|h| h.to_string()),
            body_kind: Some(headers.body_kind()),
            connection_close: headers.connection_close(),
        });
        Ok(RecordingCodec)
    }
}

impl Codec<MockData> for RecordingCodec {
    fn recv_mode(&mut self) -> RecvMode {
        RecvMode::buffered_upfront(1024)
    }
    fn data_received(&mut self, data: &[u8], end: bool)
        -> Result<Async<usize>, Error>
    {
        assert!(end);
        Ok(Async::Ready(data.len()))
    }
    fn start_response(&mut self, e: Encoder<MockData>)
        -> OptFuture<EncoderDone<MockData>, Error>
    {
        OptFuture::Value(Ok(e.done()))
    }
}

fn run(request: &str) -> Seen {
    let seen = Rc::new(RefCell::new(None));
    let mock = MockData::new();
    let mut proto = Proto::new(mock.clone(),
        RecordingDisp(seen.clone()), &Arc::new(Config::new()));
    proto.poll().unwrap();
    mock.add_input(request);
    proto.poll().unwrap();
    seen.borrow_mut().take().expect("headers_received was called")
}

#[test]
fn parses_method_path_and_host() {
    let seen = run("GET /foo/bar HTTP/1.1\r\nHost: example.com\r\n\r\n");
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/foo/bar");
    assert_eq!(seen.host.as_deref(), Some("example.com"));
    assert_eq!(seen.body_kind, Some(BodyKind::Fixed(0)));
}

#[test]
fn detects_fixed_length_body() {
    let seen = run("POST /upload HTTP/1.1\r\n\
        Host: example.com\r\nContent-Length: 5\r\n\r\nhello");
    assert_eq!(seen.body_kind, Some(BodyKind::Fixed(5)));
}

#[test]
fn detects_chunked_body() {
    let seen = run("POST /upload HTTP/1.1\r\n\
        Host: example.com\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n");
    assert_eq!(seen.body_kind, Some(BodyKind::Chunked));
}

#[test]
fn detects_connection_close() {
    let seen = run("GET / HTTP/1.1\r\n\
        Host: example.com\r\nConnection: close\r\n\r\n");
    assert!(seen.connection_close);
}

#[test]
fn http_10_defaults_to_close() {
    let seen = run("GET / HTTP/1.0\r\nHost: example.com\r\n\r\n");
    assert!(seen.connection_close);
}
