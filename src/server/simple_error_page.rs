//! The default error page used by the responder (`proto.rs`) whenever a
//! route is missing or a request is rejected before dispatch.
use std::io::Write;

use enums::Status;
use super::encoder::{Encoder, EncoderDone};

const PART1: &'static str = "\
    <!DOCTYPE html>
    <html>\
        <head>\
            <title>\
    ";
const PART2: &'static str = "\
            </title>\
        </head>\
        <body>\
            <h1>\
    ";
const PART3: &'static str = concat!("\
            </h1>\
            <hr>\
            <p>Yours faithfully,<br>\
                loom-http/", env!("CARGO_PKG_VERSION"), "\
            </p>
        </body>
    </html>
    ");

/// Renders `status` as a minimal HTML error page directly into `enc`.
pub fn render<S>(mut enc: Encoder<S>, status: Status) -> EncoderDone<S> {
    let code = status.code();
    let reason = status.reason();
    let content_length = PART1.len() + PART2.len() + PART3.len() +
        2 * (4 + reason.as_bytes().len());
    enc.status(status);
    enc.add_length(content_length as u64).unwrap();
    enc.add_header("Content-Type", "text/html").unwrap();
    if enc.done_headers().unwrap() {
        write!(&mut enc, "\
            {p1}{code:03} {status}{p2}{code:03} {status}{p3}",
                code = code, status = reason,
                p1 = PART1, p2 = PART2, p3 = PART3)
            .expect("writing to a buffer always succeeds");
    }
    enc.done()
}

#[cfg(test)]
mod test {
    use tk_bufstream::{MockData, IoBuf};
    use enums::{Version, Status};
    use super::super::encoder::{new, ResponseConfig};
    use super::render;

    #[test]
    fn renders_404() {
        let mock = MockData::new();
        let enc = new(IoBuf::new(mock.clone()).split().0, ResponseConfig {
            is_head: false,
            do_close: false,
            version: Version::Http11,
        });
        let done = render(enc, Status::NotFound);
        super::super::encoder::get_inner(done).flush().unwrap();
        let out = String::from_utf8_lossy(&mock.output(..)).to_string();
        assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(out.contains("404 Not Found"));
    }
}
