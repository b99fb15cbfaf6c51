//! Crate-wide error kinds
//!
//! Connection-level errors from both `server` and `client` are narrower
//! (see `server::Error` and `client::Error`); this enum is the kind
//! vocabulary used by the parts of the crate that are shared between the
//! two sides: the chunked decoder, the buffer pool and the URI parser.
use std::io;

use httparse;


quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// A `Codec`/`Dispatcher` callback returned `false` or otherwise
        /// asked to stop processing the connection.
        UserCancelled {
            description("request handler cancelled the connection")
        }
        /// Request or response line / headers could not be parsed.
        HttpHeaders(err: httparse::Error) {
            description("malformed request or response headers")
            display("malformed headers: {:?}", err)
            from()
        }
        /// Chunked transfer-encoding framing was invalid.
        HttpChunked(err: httparse::InvalidChunkSize) {
            description("malformed chunked encoding")
            display("malformed chunked encoding: {:?}", err)
            from()
        }
        /// Underlying socket I/O failed.
        SocketError(err: io::Error) {
            description("socket error")
            display("socket error: {}", err)
            from()
        }
        /// A `stat`/`open`/`read` call for a served file failed.
        FilesystemError(err: io::Error) {
            description("filesystem error")
            display("filesystem error: {}", err)
        }
        /// The buffer pool could not satisfy an allocation.
        OutOfMemory {
            description("buffer pool is out of memory")
        }
        /// A client request URL failed to parse.
        InvalidUrl(reason: &'static str) {
            description("invalid url")
            display("invalid url: {}", reason)
        }
    }
}

#[cfg(test)]
mod test {
    use super::Error;

    #[test]
    fn display_user_cancelled() {
        assert_eq!(format!("{}", Error::UserCancelled),
            "request handler cancelled the connection");
    }

    #[test]
    fn display_invalid_url() {
        assert_eq!(format!("{}", Error::InvalidUrl("missing host")),
            "invalid url: missing host");
    }
}
