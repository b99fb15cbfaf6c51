use std::sync::Arc;
use std::time::Duration;

use server::Config;

impl Config {
    /// Create a config with defaults: a 64KiB buffer baseline, an
    /// 8MiB cap on buffered request bodies, a 128-connection listen
    /// backlog, and a 30s TCP keepalive.
    pub fn new() -> Config {
        Config {
            inflight_request_limit: 2,
            inflight_request_prealloc: 0,
            buffer_baseline: 65536,
            max_request_body: 8 * 1024 * 1024,
            listen_backlog: 128,
            tcp_keepalive: Duration::from_secs(30),
        }
    }

    /// A number of inflight requests until we stop reading more requests.
    pub fn inflight_request_limit(&mut self, value: usize) -> &mut Self {
        self.inflight_request_limit = value;
        self
    }

    /// Size of the queue that is preallocated for holding requests.
    ///
    /// Should be smaller than `inflight_request_limit`.
    pub fn inflight_request_prealloc(&mut self, value: usize) -> &mut Self {
        self.inflight_request_prealloc = value;
        self
    }

    /// Baseline size for pooled buffers (`pool::Pool`).
    pub fn buffer_baseline(&mut self, value: usize) -> &mut Self {
        self.buffer_baseline = value;
        self
    }

    /// Upper bound on a request body accepted in `BufferedUpfront` mode;
    /// larger bodies are rejected before they're read.
    pub fn max_request_body(&mut self, value: u64) -> &mut Self {
        self.max_request_body = value;
        self
    }

    /// `listen(2)` backlog for the accepting socket.
    pub fn listen_backlog(&mut self, value: i32) -> &mut Self {
        self.listen_backlog = value;
        self
    }

    /// `SO_KEEPALIVE` interval for accepted connections.
    pub fn tcp_keepalive(&mut self, value: Duration) -> &mut Self {
        self.tcp_keepalive = value;
        self
    }

    /// Create an `Arc`'d config clone to pass to the constructor.
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}
