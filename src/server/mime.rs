//! Fixed extension-to-MIME-type table used by `serve_file`.
//!
//! Deliberately a flat linear scan over a `const` slice rather than a
//! `HashMap`: the table is tiny and immutable, matching how
//! `enums::Status` resolves its own reason phrases by pattern match
//! instead of a lookup structure.
const TABLE: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("css", "text/css"),
    ("gif", "image/gif"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("svg", "image/svg+xml"),
    ("flv", "video/x-flv"),
    ("3gp", "video/3gpp"),
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("mov", "video/quicktime"),
    ("mp4", "video/mp4"),
    ("ts", "video/mp2t"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("pdf", "application/pdf"),
    ("wasm", "application/wasm"),
    ("xml", "application/xml"),
    ("php", "application/x-httpd-php"),
];

/// Look up a MIME type by file extension (case-insensitive, no leading
/// dot). Returns `None` for unrecognized extensions -- the caller then
/// leaves `Content-Type` unset rather than guessing.
pub fn lookup(extension: &str) -> Option<&'static str> {
    TABLE.iter()
        .find(|&&(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|&(_, mime)| mime)
}

/// Convenience wrapper that pulls the extension off a path.
pub fn for_path(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?;
    if ext == path {
        return None;
    }
    lookup(ext)
}

#[cfg(test)]
mod test {
    use super::{lookup, for_path};

    #[test]
    fn known_extensions() {
        assert_eq!(lookup("html"), Some("text/html"));
        assert_eq!(lookup("HTML"), Some("text/html"));
        assert_eq!(lookup("js"), Some("application/javascript"));
    }

    #[test]
    fn unknown_extension() {
        assert_eq!(lookup("exe"), None);
    }

    #[test]
    fn path_without_extension() {
        assert_eq!(for_path("Makefile"), None);
    }

    #[test]
    fn path_with_extension() {
        assert_eq!(for_path("/static/app.js"), Some("application/javascript"));
    }
}
