//! Convenience single-shot fetch: resolve, connect, send a buffered
//! request, buffer the response, and follow redirects.
//!
//! Also houses `pull`, a sibling helper that drives a local file through
//! the same `on_content`-shaped contract as a streamed response body.
//!
//! This is the "simple" interface the crate-level docs point at; anything
//! needing manual pipelining should drive `client::proto::Proto` directly
//! instead.
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::net::{SocketAddr, SocketAddrV4, SocketAddrV6};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::from_utf8;
use std::sync::Arc;

use url::{Url, Host};
use futures::{Future, IntoFuture, Sink};
use futures::future::{loop_fn, Loop};
use abstract_ns::{Resolver, Error as NsError};
use futures_cpupool::CpuPool;
use ns_std_threaded::ThreadedResolver;
use tokio_core::reactor::Handle;
use tokio_core::net::TcpStream;

use OptFuture;
use enums::HttpStatus;
use headers::is_close;
use loop_facade::LoopFacade;
use pool;
use client::{Config, Error};
use client::proto::Proto;
use client::buffered::{Buffered, Response};

/// Hard cap on the redirect chain, so a server that keeps redirecting to
/// itself can't spin `fetch` forever.
const MAX_REDIRECTS: u32 = 10;

thread_local! {
    /// Warm keep-alive connections, one per `host:port`, reused by
    /// `fetch_once` instead of paying a fresh DNS resolve + TCP connect
    /// for every request or redirect hop. Not `Send`: `Proto` holds a
    /// `tokio_core::reactor::Handle`, so this lives on the loop thread.
    static CONN_CACHE: RefCell<HashMap<(String, u16), Proto<TcpStream, Buffered>>> =
        RefCell::new(HashMap::new());
}

fn cache_key(url: &Url) -> Option<(String, u16)> {
    url.host_str().map(|h| (h.to_string(), url.port_or_known_default().unwrap_or(80)))
}

fn take_cached(key: &(String, u16)) -> Option<Proto<TcpStream, Buffered>> {
    CONN_CACHE.with(|c| c.borrow_mut().remove(key))
}

fn store_cached(key: (String, u16), proto: Proto<TcpStream, Buffered>) {
    CONN_CACHE.with(|c| { c.borrow_mut().insert(key, proto); });
}

/// Whether the connection that produced `response` may be reused: no
/// `Connection: close` header (HTTP/1.1 defaults to keep-alive).
fn response_keep_alive(response: &Response) -> bool {
    !response.headers().iter()
        .any(|&(ref name, ref value)|
            name.eq_ignore_ascii_case("Connection") && is_close(value))
}

fn resolve_host(dom: &str, port: u16) -> OptFuture<SocketAddr, Error> {
    let ns = ThreadedResolver::new(CpuPool::new(1));
    OptFuture::Future(Box::new(
        ns.resolve(&format!("{}:{}", dom, port))
            .map_err(Error::Name)
            .and_then(|addr| {
                addr.pick_one().ok_or(NsError::NameNotFound)
                    .map_err(Error::Name)
            })
    ))
}

fn connect(url: &Url, handle: &Handle)
    -> Box<Future<Item=TcpStream, Error=Error>>
{
    if !url.has_host() || url.scheme() != "http" {
        return Box::new(Err(Error::UnsupportedScheme).into_future());
    }
    let port = url.port().unwrap_or(80);
    let handle = handle.clone();
    let addr = match url.host().unwrap() {
        Host::Domain(dom) => resolve_host(dom, port),
        Host::Ipv4(addr) => OptFuture::Value(Ok(
            SocketAddr::V4(SocketAddrV4::new(addr, port)))),
        Host::Ipv6(addr) => OptFuture::Value(Ok(
            SocketAddr::V6(SocketAddrV6::new(addr, port, 0, 0)))),
    };
    Box::new(addr.and_then(move |addr| {
        TcpStream::connect(&addr, &handle).map_err(Error::Io)
    }))
}

/// `Location` target of a redirect response, resolved against `base`.
///
/// Returns `None` for anything that isn't a 300-310 redirect with a valid
/// `Location` header, which tells the caller to stop following.
fn redirect_target(base: &Url, response: &Response) -> Option<Url> {
    let code = response.status().code();
    if code < 300 || code > 310 {
        return None;
    }
    response.headers().iter()
        .find(|&&(ref name, _)| name.eq_ignore_ascii_case("Location"))
        .and_then(|&(_, ref value)| from_utf8(value).ok())
        .and_then(|loc| base.join(loc).ok())
}

/// Send `codec` over an already-established `proto`, then -- if the
/// response allows keep-alive -- return the connection to `CONN_CACHE`
/// under `key` for the next request to this host to pick up.
fn send_and_record(proto: Proto<TcpStream, Buffered>, url: Url,
    key: Option<(String, u16)>)
    -> Box<Future<Item=(Url, Response), Error=Error>>
{
    let (codec, receiver) = Buffered::get(url.clone());
    Box::new(proto.send(codec)
        .join(receiver.map_err(|_| Error::Canceled))
        .and_then(move |(proto, result)| {
            let response = result?;
            if let Some(k) = key {
                if response_keep_alive(&response) {
                    store_cached(k, proto);
                }
            }
            Ok((url, response))
        }))
}

fn fetch_fresh(url: Url, handle: Handle, cfg: Arc<Config>,
    key: Option<(String, u16)>)
    -> Box<Future<Item=(Url, Response), Error=Error>>
{
    Box::new(connect(&url, &handle).and_then(move |sock| {
        let proto = Proto::new(sock, &handle, &cfg);
        send_and_record(proto, url, key)
    }))
}

fn fetch_once(url: Url, handle: &Handle, cfg: &Arc<Config>)
    -> Box<Future<Item=(Url, Response), Error=Error>>
{
    let handle = handle.clone();
    let cfg = cfg.clone();
    let key = cache_key(&url);
    let cached = key.clone().and_then(|k| take_cached(&k));
    match cached {
        Some(proto) => {
            let retry_url = url.clone();
            let retry_key = key.clone();
            Box::new(
                send_and_record(proto, url, key)
                    .or_else(move |err| -> Box<Future<Item=(Url, Response), Error=Error>> {
                        match err {
                            // The cached socket was closed by the peer
                            // while idle; the failure only shows up once
                            // we try to use it, so fall back to a fresh
                            // connection rather than surfacing it to the
                            // caller.
                            Error::Closed => fetch_fresh(retry_url, handle, cfg, retry_key),
                            other => Box::new(Err(other).into_future()),
                        }
                    })
            )
        }
        None => fetch_fresh(url, handle, cfg, key),
    }
}

/// Fetch a URL, fully buffering the response body.
///
/// Follows redirects (a 300-310 status with a `Location` header) up to
/// `MAX_REDIRECTS` times. Each attempt first checks the per-host
/// keep-alive cache (keyed by `host:port`) for a warm connection before
/// paying for a fresh DNS resolution and TCP connect.
pub fn fetch(url: Url, handle: &Handle, cfg: &Arc<Config>)
    -> Box<Future<Item=Response, Error=Error>>
{
    let handle = handle.clone();
    let cfg = cfg.clone();
    Box::new(loop_fn((url, 0u32), move |(url, redirects)| {
        fetch_once(url, &handle, &cfg).map(move |(fetch_url, response)| {
            if redirects < MAX_REDIRECTS {
                if let Some(next) = redirect_target(&fetch_url, &response) {
                    return Loop::Continue((next, redirects + 1));
                }
            }
            Loop::Break(response)
        })
    }))
}

/// Read up to one `pull` chunk starting at `offset`; `true` in the
/// second element means the file is exhausted (this was the final
/// chunk, possibly empty).
fn read_chunk_at(path: &Path, offset: u64) -> io::Result<(Vec<u8>, bool)> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if offset >= len {
        return Ok((Vec::new(), true));
    }
    file.seek(SeekFrom::Start(offset))?;
    let want = (len - offset).min(pool::DEFAULT_CAPACITY as u64) as usize;
    let mut buf = vec![0u8; want];
    let mut read = 0;
    while read < want {
        let n = file.read(&mut buf[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    buf.truncate(read);
    let done = offset + read as u64 >= len;
    Ok((buf, done))
}

fn pull_step<F>(path: Arc<PathBuf>, offset: u64, on_content: Rc<RefCell<F>>,
    facade: LoopFacade) -> Box<Future<Item=(), Error=Error>>
    where F: FnMut(&[u8], u64, bool) -> bool + 'static
{
    let work_path = path.clone();
    Box::new(facade.queue_work(move || read_chunk_at(&work_path, offset).map_err(Error::Io))
        .and_then(move |(data, done)| -> Box<Future<Item=(), Error=Error>> {
            let len = data.len() as u64;
            let keep_going = (&mut *on_content.borrow_mut())(&data, len, done);
            if !keep_going {
                return Box::new(Err(Error::UserCancelled).into_future());
            }
            if done {
                return Box::new(Ok(()).into_future());
            }
            pull_step(path, offset + len, on_content, facade)
        }))
}

/// Drive a local file through the same `on_content(data, size, is_final)`
/// contract a streamed response body uses, one chunk at a time.
///
/// Reads are offloaded onto `facade`'s worker pool (`tokio-core` has no
/// native async file I/O), with at most one outstanding read in flight;
/// returning `false` from `on_content` stops the pull and resolves the
/// returned future with `Error::UserCancelled`.
pub fn pull<F>(path: PathBuf, facade: LoopFacade, on_content: F)
    -> Box<Future<Item=(), Error=Error>>
    where F: FnMut(&[u8], u64, bool) -> bool + 'static
{
    pull_step(Arc::new(path), 0, Rc::new(RefCell::new(on_content)), facade)
}
