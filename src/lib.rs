//! Simple HTTP service based on `tokio` tools
#![recursion_limit="100"]

extern crate futures;
extern crate url;
extern crate httparse;
extern crate tokio_core;
extern crate tokio_io;
extern crate netbuf;
extern crate tk_bufstream;
extern crate regex;
extern crate memmap2;
#[cfg(feature = "date_header")] extern crate httpdate;
#[macro_use(quick_error)] extern crate quick_error;
#[macro_use] extern crate matches;
#[macro_use] extern crate log;
// These ones for the "simple" fetch/serve interfaces
extern crate abstract_ns;
extern crate futures_cpupool;
extern crate ns_std_threaded;


pub mod server;
pub mod client;
mod enums;
mod headers;
mod base_serializer;
mod opt_future;
mod chunked;
mod body_parser;
mod error;
mod pool;
mod uri;
mod loop_facade;

pub use enums::{Version, Status, HttpStatus, Method, Header};
pub use opt_future::OptFuture;
pub use error::Error;
pub use pool::{Pool, PoolBuffer, Stats as PoolStats};
pub use uri::Uri;
pub use loop_facade::LoopFacade;
