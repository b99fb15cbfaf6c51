//! Path routing: an exact-match table checked first, then an ordered
//! list of regexes, first match wins.
use std::collections::HashMap;
use std::rc::Rc;

use regex::Regex;

use OptFuture;
use server::Error;
use server::Request;
use server::encoder::{Encoder, EncoderDone};

/// Hooks a route may provide.
///
/// `on_start` is an admission check run as soon as headers are parsed
/// (before the body, if any, is read); returning `false` rejects the
/// request without reading its body. `on_data` is invoked per body
/// chunk when the route's `recv_mode` is progressive. `on_route` is the
/// final handler, called once the request (and, in buffered mode, its
/// body) is fully available.
pub trait Route<S> {
    fn on_start(&self, _req: &Request) -> bool { true }
    fn on_data(&self, _req: &Request, _chunk: &[u8]) -> bool { true }
    fn on_route(&self, req: &Request, enc: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>;
}

/// A route built from a single closure, for the common case where no
/// admission check or streaming hook is needed.
pub struct Lambda<F>(pub F);

impl<S, F> Route<S> for Lambda<F>
    where F: Fn(&Request, Encoder<S>) -> OptFuture<EncoderDone<S>, Error>
{
    fn on_route(&self, req: &Request, enc: Encoder<S>)
        -> OptFuture<EncoderDone<S>, Error>
    {
        (self.0)(req, enc)
    }
}

/// Router table: built once before `listen`, immutable afterwards.
pub struct Router<S> {
    exact: HashMap<String, Rc<dyn Route<S>>>,
    patterns: Vec<(Regex, Rc<dyn Route<S>>)>,
}

impl<S> Router<S> {
    pub fn new() -> Router<S> {
        Router { exact: HashMap::new(), patterns: Vec::new() }
    }

    /// Register a route for an exact path.
    pub fn add(&mut self, path: &str, route: Rc<dyn Route<S>>) {
        self.exact.insert(path.to_string(), route);
    }

    /// Register a route for every path matching `pattern`, checked in
    /// the order patterns were registered, after all exact matches.
    pub fn add_pattern(&mut self, pattern: &str, route: Rc<dyn Route<S>>)
        -> Result<(), ::regex::Error>
    {
        let re = Regex::new(pattern)?;
        self.patterns.push((re, route));
        Ok(())
    }

    /// Find the route serving `path`, if any.
    pub fn lookup(&self, path: &str) -> Option<Rc<dyn Route<S>>> {
        if let Some(route) = self.exact.get(path) {
            return Some(route.clone());
        }
        self.patterns.iter()
            .find(|(re, _)| re.is_match(path))
            .map(|(_, route)| route.clone())
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;
    use server::Request;
    use server::Error;
    use server::encoder::{Encoder, EncoderDone};
    use OptFuture;
    use super::{Router, Route};

    struct MockIo;

    struct Always200;
    impl Route<MockIo> for Always200 {
        fn on_route(&self, _req: &Request, _enc: Encoder<MockIo>)
            -> OptFuture<EncoderDone<MockIo>, Error>
        {
            unreachable!("not exercised in routing-only tests")
        }
    }

    #[test]
    fn exact_beats_pattern() {
        let mut r: Router<MockIo> = Router::new();
        r.add("/a", Rc::new(Always200));
        r.add_pattern("^/.*$", Rc::new(Always200)).unwrap();
        assert!(r.lookup("/a").is_some());
        assert!(r.lookup("/elsewhere").is_some());
    }

    #[test]
    fn no_match() {
        let r: Router<MockIo> = Router::new();
        assert!(r.lookup("/missing").is_none());
    }

    #[test]
    fn pattern_order_first_match_wins() {
        let mut r: Router<MockIo> = Router::new();
        r.add_pattern("^/first", Rc::new(Always200)).unwrap();
        r.add_pattern("^/.*$", Rc::new(Always200)).unwrap();
        assert!(r.lookup("/first/x").is_some());
    }
}
