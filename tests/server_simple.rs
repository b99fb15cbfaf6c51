extern crate futures;
extern crate loom_http;
extern crate tk_bufstream;

use std::sync::Arc;

use futures::{Future, Async};
use tk_bufstream::MockData;

use loom_http::OptFuture;
use loom_http::server::{Proto, Config, Dispatcher, Codec};
use loom_http::server::{Head, RecvMode, Error, Encoder, EncoderDone};

struct MockDisp;

struct MockCodec;

impl Dispatcher<MockData> for MockDisp {
    type Codec = MockCodec;

    fn headers_received(&mut self, _headers: &Head<'_>)
        -> Result<Self::Codec, Error>
    {
        Ok(MockCodec)
    }
}

impl Codec<MockData> for MockCodec {
    fn recv_mode(&mut self) -> RecvMode {
        RecvMode::buffered_upfront(1024)
    }
    fn data_received(&mut self, data: &[u8], end: bool)
        -> Result<Async<usize>, Error>
    {
        assert!(end);
        assert_eq!(data.len(), 0);
        Ok(Async::Ready(0))
    }
    fn start_response(&mut self, e: Encoder<MockData>)
        -> OptFuture<EncoderDone<MockData>, Error>
    {
        OptFuture::Value(Ok(e.done()))
    }
}

#[test]
fn simple_get_request() {
    let mock = MockData::new();
    let mut proto = Proto::new(mock.clone(), MockDisp, &Arc::new(Config::new()));
    proto.poll().unwrap();
    mock.add_input("GET / HTTP/1.0\r\n\r\n");
    proto.poll().unwrap();
}

#[test]
#[should_panic(expected="Version")]
fn failing_get_request() {
    let mock = MockData::new();
    let mut proto = Proto::new(mock.clone(), MockDisp, &Arc::new(Config::new()));
    proto.poll().unwrap();
    mock.add_input("GET / TTMP/2.0\r\n\r\n");
    proto.poll().unwrap();
}
