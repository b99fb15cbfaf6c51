//! Process-wide cache of memory-mapped static files, keyed by path and
//! invalidated on mtime change.
//!
//! Uses `memmap2::Mmap` wrapped in `Arc` so the cache entry and any
//! in-flight response producer that captured it share ownership for
//! free -- the region unmaps itself when the last holder (cache or
//! producer) drops it.
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::cell::RefCell;
use std::sync::Arc;
use std::time::SystemTime;

use memmap2::Mmap;

/// Files larger than this are never memory-mapped; `serve_file` falls
/// back to streamed reads for them (mapping a multi-gigabyte file just
/// to serve a byte range is wasteful and, on 32-bit targets, can simply
/// fail).
pub const MAX_MAPPED_SIZE: u64 = i32::max_value() as u64;

#[derive(Clone)]
pub struct CachedFile {
    pub mmap: Arc<Mmap>,
    pub len: u64,
    pub mime: Option<&'static str>,
}

struct Entry {
    mtime: SystemTime,
    file: CachedFile,
}

/// Per-server cache. Not `Send`/`Sync`: all mutation happens on the loop
/// thread; cross-thread invalidation requests are marshalled onto the
/// loop thread via `remote_removable` before reaching `remove`.
pub struct FileCache {
    entries: RefCell<HashMap<PathBuf, Entry>>,
}

/// Outcome of looking a path up for serving.
pub enum Lookup {
    /// A regular, mappable file.
    File(CachedFile),
    /// A regular file too large to map; caller should stream it.
    Stream { path: PathBuf, len: u64, mime: Option<&'static str> },
    NotFound,
    Forbidden,
}

impl FileCache {
    pub fn new() -> Rc<FileCache> {
        Rc::new(FileCache { entries: RefCell::new(HashMap::new()) })
    }

    /// Resolve `path` to cacheable content, mapping it fresh if this is
    /// the first request for it or if its mtime changed since it was
    /// last cached.
    pub fn lookup(&self, path: &Path) -> Lookup {
        let meta = match ::std::fs::metadata(path) {
            Ok(m) => m,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                return Lookup::NotFound;
            }
            Err(ref e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Lookup::Forbidden;
            }
            Err(_) => return Lookup::NotFound,
        };
        if !meta.is_file() {
            return Lookup::NotFound;
        }
        let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let len = meta.len();
        let mime = super::mime::for_path(&path.to_string_lossy());

        if let Some(entry) = self.entries.borrow().get(path) {
            if entry.mtime == mtime {
                return Lookup::File(entry.file.clone());
            }
        }

        if len > MAX_MAPPED_SIZE {
            return Lookup::Stream { path: path.to_path_buf(), len, mime };
        }
        if len == 0 {
            // `Mmap::map` refuses zero-length files; an empty body needs
            // no mapping at all, so the streamed path (which just writes
            // nothing) handles it instead.
            return Lookup::Stream { path: path.to_path_buf(), len: 0, mime };
        }
        let fh = match File::open(path) {
            Ok(f) => f,
            Err(ref e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Lookup::Forbidden;
            }
            Err(_) => return Lookup::NotFound,
        };
        let mmap = match unsafe { Mmap::map(&fh) } {
            Ok(m) => Arc::new(m),
            Err(_) => return Lookup::Stream { path: path.to_path_buf(), len, mime },
        };
        let file = CachedFile { mmap, len, mime };
        self.entries.borrow_mut().insert(path.to_path_buf(), Entry { mtime, file: file.clone() });
        Lookup::File(file)
    }

    /// Evict a path. Safe to call speculatively (e.g. from a filesystem
    /// watcher) even if the path was never cached.
    pub fn remove(&self, path: &Path) {
        self.entries.borrow_mut().remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Pairs a cache with a `Send`-safe handle that can request evictions
/// from any thread.
///
/// `FileCache` itself holds a `RefCell` and must only be touched on the
/// loop thread; `CacheRemover` only ever pushes a path down an unbounded
/// channel, which is safe to clone and move across threads. The
/// returned `EvictionTask` must be polled (e.g. `handle.spawn`d) on the
/// loop thread to actually apply removals.
pub fn remote_removable(cache: Rc<FileCache>) -> (CacheRemover, EvictionTask) {
    let (tx, rx) = ::futures::sync::mpsc::unbounded();
    (CacheRemover { sender: tx }, EvictionTask { cache: cache, receiver: rx })
}

/// Cross-thread handle for `FileCache` eviction.
#[derive(Clone)]
pub struct CacheRemover {
    sender: ::futures::sync::mpsc::UnboundedSender<PathBuf>,
}

impl CacheRemover {
    /// Request removal of `path`. Safe to call from any thread; the
    /// actual `FileCache::remove` call happens on the loop thread once
    /// `EvictionTask` is next polled.
    pub fn remove_cache(&self, path: PathBuf) {
        let _ = self.sender.unbounded_send(path);
    }
}

/// Drains removal requests queued by a `CacheRemover` and applies them to
/// the cache. Runs forever (until every `CacheRemover` is dropped), so
/// it's meant to be spawned alongside a server's accept loop, not awaited.
pub struct EvictionTask {
    cache: Rc<FileCache>,
    receiver: ::futures::sync::mpsc::UnboundedReceiver<PathBuf>,
}

impl ::futures::Future for EvictionTask {
    type Item = ();
    type Error = ();

    fn poll(&mut self) -> ::futures::Poll<(), ()> {
        use futures::{Async, Stream};
        loop {
            match self.receiver.poll()? {
                Async::Ready(Some(path)) => self.cache.remove(&path),
                Async::Ready(None) => return Ok(Async::Ready(())),
                Async::NotReady => return Ok(Async::NotReady),
            }
        }
    }
}

#[cfg(test)]
mod remover_test {
    use std::path::PathBuf;
    use futures::{Async, Future, Stream};
    use super::{FileCache, remote_removable};

    #[test]
    fn queued_removal_applies_once_polled() {
        let cache = FileCache::new();
        cache.entries.borrow_mut().insert(PathBuf::from("/x"), super::Entry {
            mtime: ::std::time::SystemTime::UNIX_EPOCH,
            file: super::CachedFile {
                mmap: ::std::sync::Arc::new(
                    ::memmap2::MmapMut::map_anon(1).unwrap().make_read_only().unwrap()),
                len: 1,
                mime: None,
            },
        });
        assert_eq!(cache.len(), 1);

        let (remover, mut task) = remote_removable(cache.clone());
        remover.remove_cache(PathBuf::from("/x"));
        assert_eq!(task.poll(), Ok(Async::NotReady));
        assert_eq!(cache.len(), 0);

        drop(remover);
        assert_eq!(task.poll(), Ok(Async::Ready(())));
    }
}
