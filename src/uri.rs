//! URI splitting and percent-encoding.
//!
//! This is deliberately small: full origin-form vs. absolute-form request
//! target disambiguation lives in `server::RequestTarget`, which this
//! module is used alongside (absolute-form targets and client request
//! URLs both funnel through `Uri::parse`).
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

#[derive(Debug, PartialEq, Eq)]
pub struct Uri<'a> {
    pub scheme: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub path: &'a str,
}

fn authority_end(x: &u8) -> bool {
    *x == b'/' || x == b'?' || x == b'#'
}

impl<'a> Uri<'a> {
    /// Split `scheme://host[:port][/path]` into its parts.
    ///
    /// `host` may be bracketed (`[::1]`) for an IPv6 literal; the
    /// brackets are stripped. Defaults to port 80 for `http` and 443 for
    /// `https` when no explicit port is present.
    pub fn parse(s: &'a str) -> Option<Uri<'a>> {
        let (scheme, rest) = if let Some(rest) = s.strip_prefix("http://") {
            ("http", rest)
        } else if let Some(rest) = s.strip_prefix("https://") {
            ("https", rest)
        } else {
            return None;
        };
        let default_port = if scheme == "https" { 443 } else { 80 };
        let auth_end = rest.as_bytes().iter()
            .position(authority_end)
            .unwrap_or(rest.len());
        let authority = &rest[..auth_end];
        let path = if auth_end == rest.len() { "/" } else { &rest[auth_end..] };
        if authority.is_empty() {
            return None;
        }

        let (host, port) = if authority.starts_with('[') {
            let close = authority.find(']')?;
            let host = &authority[1..close];
            let port = match authority[close + 1..].as_bytes().first() {
                Some(&b':') => authority[close + 2..].parse().ok()?,
                None => default_port,
                _ => return None,
            };
            (host, port)
        } else if let Some(colon) = authority.rfind(':') {
            let port = authority[colon + 1..].parse().ok()?;
            (&authority[..colon], port)
        } else {
            (authority, default_port)
        };
        if host.is_empty() {
            return None;
        }
        Some(Uri { scheme: scheme, host: host, port: port, path: path })
    }
}

/// Bytes that must be percent-encoded by `encode`, beyond non-ASCII.
fn needs_escape(b: u8) -> bool {
    b >= 0x80 || matches!(b,
        b' ' | b'+' | b'\r' | b'\n' | b'\'' | b',' | b';' | b'%' | b'#' |
        b'?' | b'"' | b'<' | b'>' | b'`')
}

/// Percent-encode bytes outside the unreserved set.
pub fn encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if needs_escape(b) {
            write!(out, "%{:02X}", b).unwrap();
        } else {
            out.push(b as char);
        }
    }
    out
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Reverse percent-encoding and `+` (space, in query strings).
///
/// Supports both `%HH` and the legacy `%uHHHH` form, the latter decoded
/// as a single UTF-8-encoded code point. Invalid escapes are passed
/// through verbatim rather than rejected, matching how browsers and most
/// HTTP servers behave in practice.
pub fn decode(s: &str) -> Cow<str> {
    if !s.as_bytes().iter().any(|&b| b == b'%' || b == b'+') {
        return Cow::Borrowed(s);
    }
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 1 < bytes.len() && bytes[i + 1] == b'u'
                && i + 6 <= bytes.len() => {
                let hex = &bytes[i + 2..i + 6];
                if let Some(cp) = hex.iter().try_fold(0u32, |acc, &b| {
                    hex_val(b).map(|v| acc * 16 + v as u32)
                }) {
                    if let Some(c) = char::from_u32(cp) {
                        let mut buf = [0u8; 4];
                        out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                        i += 6;
                        continue;
                    }
                }
                out.push(bytes[i]);
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                match (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi * 16 + lo);
                        i += 3;
                    }
                    _ => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

/// Split a `path?query` target into the bare path and a decoded query map.
///
/// Later occurrences of a repeated key overwrite earlier ones, matching
/// the header map's last-write-wins policy.
pub fn split_query(target: &str) -> (&str, HashMap<String, String>) {
    let mut map = HashMap::new();
    let (path, query) = match target.find('?') {
        Some(pos) => (&target[..pos], &target[pos + 1..]),
        None => return (target, map),
    };
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (k, v) = match pair.find('=') {
            Some(pos) => (&pair[..pos], &pair[pos + 1..]),
            None => (pair, ""),
        };
        map.insert(decode(k).into_owned(), decode(v).into_owned());
    }
    (path, map)
}

#[cfg(test)]
mod test {
    use super::{Uri, encode, decode, split_query};

    #[test]
    fn parse_plain() {
        let u = Uri::parse("http://example.com/hello").unwrap();
        assert_eq!(u, Uri { scheme: "http", host: "example.com", port: 80,
            path: "/hello" });
    }

    #[test]
    fn parse_https_default_port() {
        let u = Uri::parse("https://example.com").unwrap();
        assert_eq!(u, Uri { scheme: "https", host: "example.com", port: 443,
            path: "/" });
    }

    #[test]
    fn parse_explicit_port() {
        let u = Uri::parse("http://example.com:8080/a/b?c=d").unwrap();
        assert_eq!(u, Uri { scheme: "http", host: "example.com", port: 8080,
            path: "/a/b?c=d" });
    }

    #[test]
    fn parse_ipv6() {
        let u = Uri::parse("http://[::1]:9000/x").unwrap();
        assert_eq!(u, Uri { scheme: "http", host: "::1", port: 9000,
            path: "/x" });
    }

    #[test]
    fn parse_rejects_other_schemes() {
        assert!(Uri::parse("ftp://example.com/").is_none());
    }

    #[test]
    fn roundtrip_encode_decode() {
        let samples = ["hello world", "a+b=c", "100%", "héllo", "/a/b?c"];
        for s in &samples {
            assert_eq!(decode(&encode(s)), *s);
        }
    }

    #[test]
    fn decode_plus_is_space_but_encode_keeps_escaping_it() {
        assert_eq!(decode("a+b"), "a b");
        assert_eq!(encode("a+b"), "a%2Bb");
    }

    #[test]
    fn query_parsing() {
        let (path, q) = split_query("/search?q=rust+lang&empty");
        assert_eq!(path, "/search");
        assert_eq!(q.get("q").map(|s| s.as_str()), Some("rust lang"));
        assert_eq!(q.get("empty").map(|s| s.as_str()), Some(""));
    }

    #[test]
    fn query_last_value_wins() {
        let (_, q) = split_query("/x?a=1&a=2");
        assert_eq!(q.get("a").map(|s| s.as_str()), Some("2"));
    }
}
