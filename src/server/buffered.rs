//! Higher-level server interface: buffers the whole request body, looks
//! the path up in a `Router`, and falls back to a default 404 page.
use std::net::SocketAddr;
use std::rc::Rc;

use futures::Async;
use tokio_core::io::Io;

use OptFuture;
use enums::{Status, Version};
use super::{Error, Encoder, EncoderDone, Dispatcher, Codec, Head, RecvMode};
use super::router::{Router, Route};
use super::simple_error_page;

/// A fully buffered request handed to a matched `Route`.
#[derive(Debug)]
pub struct Request {
    peer_addr: SocketAddr,
    method: String,
    path: String,
    host: Option<String>,
    version: Version,
    headers: Vec<(String, Vec<u8>)>,
    body: Vec<u8>,
}

impl Request {
    /// Returns peer address that initiated the HTTP connection.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
    /// Returns method of a request.
    pub fn method(&self) -> &str {
        &self.method
    }
    /// Returns path of a request.
    pub fn path(&self) -> &str {
        &self.path
    }
    /// Returns HTTP version used in request.
    pub fn version(&self) -> Version {
        self.version
    }
    /// Returns request headers.
    pub fn headers(&self) -> &[(String, Vec<u8>)] {
        &self.headers
    }
    /// Returns request body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[cfg(test)]
    pub(crate) fn for_test(peer_addr: SocketAddr, method: &str, path: &str,
        host: Option<&str>, version: Version,
        headers: Vec<(String, Vec<u8>)>, body: Vec<u8>) -> Request
    {
        Request {
            peer_addr: peer_addr,
            method: method.to_string(),
            path: path.to_string(),
            host: host.map(|x| x.to_string()),
            version: version,
            headers: headers,
            body: body,
        }
    }
}

/// Routes buffered requests against a shared `Router<S>`.
pub struct BufferedDispatcher<S> {
    addr: SocketAddr,
    max_request_length: usize,
    router: Rc<Router<S>>,
}

pub struct BufferedCodec<S> {
    max_request_length: usize,
    route: Option<Rc<dyn Route<S>>>,
    admitted: bool,
    request: Option<Request>,
}

impl<S> BufferedDispatcher<S> {
    pub fn new(addr: SocketAddr, router: Rc<Router<S>>) -> BufferedDispatcher<S> {
        BufferedDispatcher {
            addr: addr,
            max_request_length: 10_485_760,
            router: router,
        }
    }
    pub fn max_request_length(&mut self, value: usize) {
        self.max_request_length = value;
    }
}

impl<S: Io> Dispatcher<S> for BufferedDispatcher<S> {
    type Codec = BufferedCodec<S>;

    fn headers_received(&mut self, headers: &Head<'_>)
        -> Result<Self::Codec, Error>
    {
        let request = Request {
            peer_addr: self.addr,
            method: headers.method().to_string(),
            path: headers.path().to_string(),
            host: headers.host().map(|x| x.to_string()),
            version: headers.version(),
            headers: headers.iter()
                .map(|(name, value)| (name.to_string(), value.to_vec()))
                .collect(),
            body: Vec::new(),
        };
        let route = self.router.lookup(request.path());
        let admitted = route.as_ref().map_or(true, |r| r.on_start(&request));
        Ok(BufferedCodec {
            max_request_length: self.max_request_length,
            route: route,
            admitted: admitted,
            request: Some(request),
        })
    }
}

impl<S: Io> Codec<S> for BufferedCodec<S> {
    fn recv_mode(&mut self) -> RecvMode {
        RecvMode::buffered_upfront(self.max_request_length)
    }
    fn data_received(&mut self, data: &[u8], _end: bool)
        -> Result<Async<usize>, Error>
    {
        if self.admitted {
            if let Some(ref route) = self.route {
                self.admitted = route.on_data(
                    self.request.as_ref().unwrap(), data);
            }
        }
        self.request.as_mut().unwrap().body.extend_from_slice(data);
        Ok(Async::Ready(data.len()))
    }
    fn start_response(&mut self, e: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>
    {
        let req = self.request.take().unwrap();
        if !self.admitted {
            return OptFuture::Value(Ok(
                simple_error_page::render(e, Status::Forbidden)));
        }
        match self.route.take() {
            Some(route) => route.on_route(&req, e),
            None => OptFuture::Value(Ok(
                simple_error_page::render(e, Status::NotFound))),
        }
    }
}
