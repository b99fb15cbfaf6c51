use std::sync::Arc;
use std::time::Duration;

use client::{Config};

impl Config {
    /// Create a config with defaults
    pub fn new() -> Config {
        Config {
            inflight_request_limit: 1,
            inflight_request_prealloc: 1,
            keep_alive_timeout: Duration::from_secs(90),
            safe_pipeline_timeout: Duration::from_secs(1),
            max_request_timeout: Duration::from_secs(180),
        }
    }
    /// A number of inflight requests until we start returning
    /// `NotReady` from `start_send`
    ///
    /// Note we always return `NotReady` if some *request* is streaming
    /// currently. Use `Sink::buffered` to prevent that.
    pub fn inflight_request_limit(&mut self, value: usize) -> &mut Self {
        self.inflight_request_limit = value;
        self
    }
    /// Size of the queue that is preallocated for holding requests
    ///
    /// Should be smaller than `inflight_request_limit`.
    pub fn inflight_request_prealloc(&mut self, value: usize) -> &mut Self {
        self.inflight_request_prealloc = value;
        self
    }
    /// How long an idle keep-alive connection may sit with no in-flight
    /// request before it's considered dead and torn down
    pub fn keep_alive_timeout(&mut self, value: Duration) -> &mut Self {
        self.keep_alive_timeout = value;
        self
    }
    /// How long we wait for a response to a pipelined request before we
    /// stop accepting new ones on this connection
    pub fn safe_pipeline_timeout(&mut self, value: Duration) -> &mut Self {
        self.safe_pipeline_timeout = value;
        self
    }
    /// Overall deadline for a single request/response round trip
    pub fn max_request_timeout(&mut self, value: Duration) -> &mut Self {
        self.max_request_timeout = value;
        self
    }
    /// Create a Arc'd config clone to pass to the constructor
    ///
    /// This is just a convenience method.
    pub fn done(&mut self) -> Arc<Config> {
        Arc::new(self.clone())
    }
}
