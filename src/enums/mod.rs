pub mod headers;
mod status;
mod version;

pub use self::headers::{Header, Method};
pub use self::status::*;
pub use self::version::*;
