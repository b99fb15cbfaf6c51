//! Static-file responder: stats a path, consults `FileCache`, and writes
//! a ranged or full response from the cached mapping (or a streamed read
//! for files too large to map).
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::from_utf8;

use enums::Status;
use pool::{self, Pool};
use uri;
use OptFuture;

use super::Error;
use super::encoder::{Encoder, EncoderDone};
use super::file_cache::{FileCache, Lookup};
use super::router::Route;
use super::simple_error_page;
use super::buffered::Request;

/// Outcome of parsing a `Range` request header against a known body
/// length.
#[derive(Debug, PartialEq, Eq)]
enum RangeSpec {
    /// No `Range` header, or one this responder doesn't understand --
    /// serve the whole body.
    None,
    /// A satisfiable `bytes=B-E` range, already clamped to `[0, len-1]`.
    Satisfiable(u64, u64),
    /// A syntactically valid range outside the representable length.
    Unsatisfiable,
}

/// Parse a single-range `Range: bytes=...` header. Multi-range requests
/// (a comma-separated list) aren't supported and fall back to `None`,
/// serving the whole body, matching how many static-file servers treat
/// a request they can't satisfy as plain rather than as an error.
fn parse_range(req: &Request, len: u64) -> RangeSpec {
    let raw = match req.headers().iter()
        .find(|&&(ref name, _)| name.eq_ignore_ascii_case("range"))
    {
        Some(&(_, ref value)) => value,
        None => return RangeSpec::None,
    };
    let text = match from_utf8(raw) {
        Ok(t) => t.trim(),
        Err(_) => return RangeSpec::None,
    };
    let spec = match text.strip_prefix("bytes=") {
        Some(s) => s,
        None => return RangeSpec::None,
    };
    if spec.contains(',') {
        return RangeSpec::None;
    }
    let dash = match spec.find('-') {
        Some(pos) => pos,
        None => return RangeSpec::None,
    };
    let (start_s, end_s) = (&spec[..dash], &spec[dash + 1..]);

    if start_s.is_empty() {
        // Suffix range: `-N` means the last N bytes.
        let n: u64 = match end_s.parse() {
            Ok(n) => n,
            Err(_) => return RangeSpec::Unsatisfiable,
        };
        if n == 0 || len == 0 {
            return RangeSpec::Unsatisfiable;
        }
        return RangeSpec::Satisfiable(len.saturating_sub(n), len - 1);
    }

    let begin: u64 = match start_s.parse() {
        Ok(n) => n,
        Err(_) => return RangeSpec::Unsatisfiable,
    };
    if len == 0 || begin >= len {
        return RangeSpec::Unsatisfiable;
    }
    let end = if end_s.is_empty() {
        len - 1
    } else {
        match end_s.parse::<u64>() {
            Ok(n) => n.min(len - 1),
            Err(_) => return RangeSpec::Unsatisfiable,
        }
    };
    if end < begin {
        return RangeSpec::Unsatisfiable;
    }
    RangeSpec::Satisfiable(begin, end)
}

fn unsatisfiable<S>(mut enc: Encoder<S>, len: u64) -> EncoderDone<S> {
    enc.status(Status::RequestRangeNotSatisfiable);
    enc.format_header("Content-Range", format_args!("bytes */{}", len)).unwrap();
    enc.add_length(0).unwrap();
    enc.done_headers().unwrap();
    enc.done()
}

/// Serve a fully mapped file straight out of memory.
fn respond_mapped<S>(mut enc: Encoder<S>, req: &Request, data: &[u8],
    len: u64, mime: Option<&'static str>) -> EncoderDone<S>
{
    match parse_range(req, len) {
        RangeSpec::Unsatisfiable => unsatisfiable(enc, len),
        RangeSpec::None => {
            enc.status(Status::Ok);
            if let Some(m) = mime {
                enc.add_header("Content-Type", m).unwrap();
            }
            enc.add_header("Accept-Ranges", "bytes").unwrap();
            enc.add_length(len).unwrap();
            if enc.done_headers().unwrap() {
                enc.write_body(data);
            }
            enc.done()
        }
        RangeSpec::Satisfiable(begin, end) => {
            enc.status(Status::PartialContent);
            if let Some(m) = mime {
                enc.add_header("Content-Type", m).unwrap();
            }
            enc.add_header("Accept-Ranges", "bytes").unwrap();
            enc.format_header("Content-Range",
                format_args!("bytes {}-{}/{}", begin, end, len)).unwrap();
            enc.add_length(end - begin + 1).unwrap();
            if enc.done_headers().unwrap() {
                enc.write_body(&data[begin as usize..end as usize + 1]);
            }
            enc.done()
        }
    }
}

/// Read `len` bytes starting at `begin`, a chunk at a time through
/// `pool`. Runs synchronously on the loop thread: `tokio-core` 0.1 has
/// no async file I/O, and routing the read through a worker pool would
/// require moving the `Encoder`'s `RawBody` (tied to the connection's
/// `Rc`-free but still single-threaded write buffer) across threads,
/// which isn't worth it for the local-disk reads this serves.
fn read_range(path: &Path, begin: u64, len: u64, pool: &Pool) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(begin))?;
    let mut out = Vec::with_capacity(len.min(pool::DEFAULT_CAPACITY as u64) as usize);
    let mut remaining = len;
    let mut chunk = pool.get(pool::DEFAULT_CAPACITY);
    while remaining > 0 {
        let want = (chunk.len() as u64).min(remaining) as usize;
        let n = file.read(&mut chunk.as_mut_slice()[..want])?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk.as_slice()[..n]);
        remaining -= n as u64;
    }
    Ok(out)
}

/// Serve a file too large to memory-map, streaming it through `pool`.
pub fn serve_stream<S>(pool: &Pool, path: PathBuf, len: u64,
    mime: Option<&'static str>, req: &Request, mut enc: Encoder<S>)
    -> OptFuture<EncoderDone<S>, Error>
{
    let range = parse_range(req, len);
    if range == RangeSpec::Unsatisfiable {
        return OptFuture::Value(Ok(unsatisfiable(enc, len)));
    }
    let (begin, end, is_partial) = match range {
        RangeSpec::Satisfiable(b, e) => (b, e, true),
        RangeSpec::None => (0, len.saturating_sub(1), false),
        RangeSpec::Unsatisfiable => unreachable!(),
    };
    enc.status(if is_partial { Status::PartialContent } else { Status::Ok });
    if let Some(m) = mime {
        enc.add_header("Content-Type", m).unwrap();
    }
    enc.add_header("Accept-Ranges", "bytes").unwrap();
    if is_partial {
        enc.format_header("Content-Range",
            format_args!("bytes {}-{}/{}", begin, end, len)).unwrap();
    }
    let want = if len == 0 { 0 } else { end - begin + 1 };
    enc.add_length(want).unwrap();
    if enc.done_headers().unwrap() && want > 0 {
        match read_range(&path, begin, want, pool) {
            Ok(data) => enc.write_body(&data),
            Err(_) => {
                // Headers are already on the wire; nothing left to do but
                // truncate the body short of its announced length.
            }
        }
    }
    OptFuture::Value(Ok(enc.done()))
}

/// Stat `fs_path`, consult `cache`, and write a response: `404` if
/// missing, `403` if unreadable, otherwise the file's bytes (honoring
/// `Range`) with `Content-Type` set from its extension.
pub fn serve_file<S>(cache: &FileCache, pool: &Pool, fs_path: &Path,
    req: &Request, enc: Encoder<S>) -> OptFuture<EncoderDone<S>, Error>
{
    match cache.lookup(fs_path) {
        Lookup::NotFound => OptFuture::Value(Ok(
            simple_error_page::render(enc, Status::NotFound))),
        Lookup::Forbidden => OptFuture::Value(Ok(
            simple_error_page::render(enc, Status::Forbidden))),
        Lookup::File(cached) => OptFuture::Value(Ok(
            respond_mapped(enc, req, &cached.mmap[..], cached.len, cached.mime))),
        Lookup::Stream { path, len, mime } => serve_stream(pool, path, len, mime, req, enc),
    }
}

/// A `Route` that serves a directory tree of static files rooted at
/// `root`, resolving `request.path()` underneath it.
pub struct StaticFiles<S> {
    cache: Rc<FileCache>,
    pool: Pool,
    root: PathBuf,
    _marker: ::std::marker::PhantomData<S>,
}

impl<S> StaticFiles<S> {
    pub fn new<P: Into<PathBuf>>(cache: Rc<FileCache>, pool: Pool, root: P)
        -> StaticFiles<S>
    {
        StaticFiles {
            cache: cache,
            pool: pool,
            root: root.into(),
            _marker: ::std::marker::PhantomData,
        }
    }

    /// Resolve a request path to a filesystem path underneath `root`,
    /// rejecting `..` segments and stripping any query string.
    fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let (path, _query) = uri::split_query(request_path);
        let decoded = uri::decode(path);
        if decoded.split('/').any(|seg| seg == "..") {
            return None;
        }
        Some(self.root.join(decoded.trim_start_matches('/')))
    }
}

impl<S> Route<S> for StaticFiles<S> {
    fn on_route(&self, req: &Request, enc: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>
    {
        match self.resolve(req.path()) {
            Some(fs_path) => serve_file(&self.cache, &self.pool, &fs_path, req, enc),
            None => OptFuture::Value(Ok(
                simple_error_page::render(enc, Status::Forbidden))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{parse_range, RangeSpec};
    use server::buffered::Request;
    use std::net::SocketAddr;
    use enums::Version;

    fn req_with_range(range: &str) -> Request {
        Request::for_test(
            "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            "GET", "/data.bin", None, Version::Http11,
            vec![("Range".to_string(), range.as_bytes().to_vec())],
            Vec::new())
    }

    fn req_without_range() -> Request {
        Request::for_test(
            "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
            "GET", "/data.bin", None, Version::Http11,
            Vec::new(), Vec::new())
    }

    #[test]
    fn no_range_header() {
        assert_eq!(parse_range(&req_without_range(), 1000), RangeSpec::None);
    }

    #[test]
    fn closed_range() {
        assert_eq!(parse_range(&req_with_range("bytes=100-199"), 1000),
            RangeSpec::Satisfiable(100, 199));
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(parse_range(&req_with_range("bytes=900-"), 1000),
            RangeSpec::Satisfiable(900, 999));
    }

    #[test]
    fn suffix_range() {
        assert_eq!(parse_range(&req_with_range("bytes=-100"), 1000),
            RangeSpec::Satisfiable(900, 999));
    }

    #[test]
    fn end_clamped_to_length() {
        assert_eq!(parse_range(&req_with_range("bytes=900-5000"), 1000),
            RangeSpec::Satisfiable(900, 999));
    }

    #[test]
    fn begin_past_end_is_unsatisfiable() {
        assert_eq!(parse_range(&req_with_range("bytes=1000-1100"), 1000),
            RangeSpec::Unsatisfiable);
    }

    #[test]
    fn multi_range_falls_back_to_whole_body() {
        assert_eq!(parse_range(&req_with_range("bytes=0-10,20-30"), 1000),
            RangeSpec::None);
    }
}
