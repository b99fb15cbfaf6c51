//! Request-line/header scanning and the RFC 7230 body-length algorithm,
//! shared by every `Proto` connection.
//!
//! The body-length precedence it follows
//! (`Transfer-Encoding: chunked` wins over `Content-Length`, duplicate
//! `Content-Length` is rejected, and no body is assumed for requests
//! lacking either header) is the same algorithm `base_serializer`
//! already enforces on the write side.
use httparse;

use enums::Version;
use headers::{is_close, is_chunked};
use super::codec::BodyKind;
use super::Error;

pub struct HeaderIter<'b, 'h: 'b> {
    pub(crate) headers: ::std::slice::Iter<'b, httparse::Header<'h>>,
}

impl<'b, 'h> Iterator for HeaderIter<'b, 'h> {
    type Item = (&'h str, &'h [u8]);
    fn next(&mut self) -> Option<Self::Item> {
        self.headers.next().map(|h| (h.name, h.value))
    }
}

/// Parsed request line plus the subset of headers needed to drive the
/// protocol (the rest are handed to the application via `headers()`).
#[derive(Debug)]
pub struct Head<'a> {
    method: &'a str,
    path: &'a str,
    version: Version,
    host: Option<&'a str>,
    headers: &'a [httparse::Header<'a>],
    body_kind: BodyKind,
    close: bool,
}

impl<'a> Head<'a> {
    pub fn method(&self) -> &'a str { self.method }
    pub fn path(&self) -> &'a str { self.path }
    pub fn version(&self) -> Version { self.version }
    pub fn host(&self) -> Option<&'a str> { self.host }
    pub fn headers(&self) -> &'a [httparse::Header<'a>] { self.headers }
    pub fn body_kind(&self) -> BodyKind { self.body_kind }
    pub fn connection_close(&self) -> bool { self.close }
    pub fn iter(&self) -> HeaderIter<'_, 'a> {
        HeaderIter { headers: self.headers.iter() }
    }
}

/// Run the body-length algorithm over a successfully parsed
/// `httparse::Request`, producing a `Head`.
///
/// Per RFC 7230 §3.3.3: a `Transfer-Encoding` containing `chunked` wins
/// regardless of any `Content-Length` present; otherwise exactly one
/// `Content-Length` determines a fixed-size body; otherwise the request
/// has no body.
pub fn scan_headers<'a>(req: &httparse::Request<'a, 'a>, version: Version)
    -> Result<Head<'a>, Error>
{
    let mut host = None;
    let mut content_length: Option<u64> = None;
    let mut chunked = false;
    let mut close = version == Version::Http10;
    let mut connection_seen = false;

    for h in req.headers.iter() {
        if h.name.eq_ignore_ascii_case("Host") {
            if host.is_some() {
                return Err(Error::DuplicateHost);
            }
            host = Some(::std::str::from_utf8(h.value)
                .map_err(|_| Error::HostInvalid)?);
        } else if h.name.eq_ignore_ascii_case("Content-Length") {
            if content_length.is_some() {
                return Err(Error::DuplicateContentLength);
            }
            let s = ::std::str::from_utf8(h.value)
                .map_err(|_| Error::ContentLengthInvalid)?;
            content_length = Some(s.trim().parse()
                .map_err(|_| Error::ContentLengthInvalid)?);
        } else if h.name.eq_ignore_ascii_case("Transfer-Encoding") {
            if is_chunked(h.value) {
                chunked = true;
            }
        } else if h.name.eq_ignore_ascii_case("Connection") {
            if connection_seen {
                return Err(Error::ConnectionInvalid);
            }
            connection_seen = true;
            if is_close(h.value) {
                close = true;
            } else if version == Version::Http10
                && h.value.eq_ignore_ascii_case(b"keep-alive")
            {
                close = false;
            }
        }
    }

    let body_kind = if chunked {
        BodyKind::Chunked
    } else if let Some(n) = content_length {
        BodyKind::Fixed(n)
    } else {
        BodyKind::Fixed(0)
    };

    Ok(Head {
        method: req.method.unwrap_or(""),
        path: req.path.unwrap_or("/"),
        version: version,
        host: host,
        headers: req.headers,
        body_kind: body_kind,
        close: close,
    })
}

#[cfg(test)]
mod test {
    use httparse;
    use enums::Version;
    use super::scan_headers;
    use server::codec::BodyKind;

    fn parse<'a>(buf: &'a [u8], storage: &'a mut [httparse::Header<'a>])
        -> httparse::Request<'a, 'a>
    {
        let mut req = httparse::Request::new(storage);
        req.parse(buf).unwrap();
        req
    }

    #[test]
    fn no_body_by_default() {
        let buf = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        let head = scan_headers(&req, Version::Http11).unwrap();
        assert_eq!(head.body_kind(), BodyKind::Fixed(0));
        assert_eq!(head.host(), Some("example.com"));
        assert!(!head.connection_close());
    }

    #[test]
    fn content_length_wins_without_chunked() {
        let buf = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 4\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        let head = scan_headers(&req, Version::Http11).unwrap();
        assert_eq!(head.body_kind(), BodyKind::Fixed(4));
    }

    #[test]
    fn chunked_wins_over_content_length() {
        let buf = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 4\r\n\
            Transfer-Encoding: chunked\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        let head = scan_headers(&req, Version::Http11).unwrap();
        assert_eq!(head.body_kind(), BodyKind::Chunked);
    }

    #[test]
    fn duplicate_content_length_rejected() {
        let buf = b"POST / HTTP/1.1\r\nHost: h\r\nContent-Length: 4\r\n\
            Content-Length: 4\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        assert!(scan_headers(&req, Version::Http11).is_err());
    }

    #[test]
    fn http10_defaults_to_close() {
        let buf = b"GET / HTTP/1.0\r\nHost: h\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        let head = scan_headers(&req, Version::Http10).unwrap();
        assert!(head.connection_close());
    }

    #[test]
    fn http10_keep_alive_overrides_default_close() {
        let buf = b"GET / HTTP/1.0\r\nHost: h\r\nConnection: keep-alive\r\n\r\n";
        let mut storage = [httparse::EMPTY_HEADER; 16];
        let req = parse(buf, &mut storage);
        let head = scan_headers(&req, Version::Http10).unwrap();
        assert!(!head.connection_close());
    }
}
