//! Route matching and upstream URL rewriting.
//!
//! The table is scanned in order; the first rule whose path-segment or
//! hostname predicate hits wins. Which predicate hit changes how the
//! upstream URL is built, so the match result carries it.

use crate::config::RouteRule;
use hyper::{Request, Uri};

/// Route table compiled for per-request matching.
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

struct CompiledRoute {
    rule: RouteRule,
    // "/{segment}/", precomputed once
    path_prefix: String,
}

/// Which predicate selected the rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    PathSegment,
    Hostname,
}

/// Outcome of a table scan: the winning rule and how it won.
pub struct RouteMatch<'a> {
    pub rule: &'a RouteRule,
    pub kind: MatchKind,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        let routes = rules
            .into_iter()
            .map(|rule| CompiledRoute {
                path_prefix: format!("/{}/", rule.path_segment),
                rule,
            })
            .collect();
        Self { routes }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match a request against the table. First match wins.
    pub fn match_request<B>(&self, req: &Request<B>) -> Option<RouteMatch<'_>> {
        let path = req.uri().path();
        let host = request_host(req);

        for route in &self.routes {
            if path.starts_with(&route.path_prefix) {
                return Some(RouteMatch {
                    rule: &route.rule,
                    kind: MatchKind::PathSegment,
                });
            }
            if let (Some(host), Some(expected)) = (host, route.rule.or_hostname.as_deref()) {
                if host.eq_ignore_ascii_case(expected) {
                    return Some(RouteMatch {
                        rule: &route.rule,
                        kind: MatchKind::Hostname,
                    });
                }
            }
        }
        None
    }
}

/// Build the upstream URL for a matched request.
///
/// A path-segment match replaces the first `/{segment}/` with `/` and keeps
/// the rest of the path; a hostname match keeps the whole original path.
/// The query string rides along verbatim either way.
pub fn rewrite_url(matched: &RouteMatch<'_>, uri: &Uri) -> String {
    let path = uri.path();
    let rewritten = match matched.kind {
        MatchKind::PathSegment => {
            let prefix = format!("/{}/", matched.rule.path_segment);
            path.replacen(&prefix, "/", 1)
        }
        MatchKind::Hostname => path.to_string(),
    };
    match uri.query() {
        Some(q) if !q.is_empty() => format!("{}{}?{}", matched.rule.target, rewritten, q),
        _ => format!("{}{}", matched.rule.target, rewritten),
    }
}

/// Hostname of the request: URI authority first, `host` header as fallback.
/// The port, if present, is not part of the hostname.
fn request_host<B>(req: &Request<B>) -> Option<&str> {
    req.uri()
        .host()
        .or_else(|| req.headers().get("host").and_then(|h| h.to_str().ok()))
        .map(strip_port)
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 literal, keep the brackets
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.find(':') {
            Some(colon) => &host[..colon],
            None => host,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_route_table;

    fn table() -> RouteTable {
        RouteTable::new(default_route_table())
    }

    fn get(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[test]
    fn test_path_segment_match() {
        let table = table();
        let req = get("http://gw.local/openai/v1/chat/completions");

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.rule.path_segment, "openai");
        assert_eq!(matched.kind, MatchKind::PathSegment);
    }

    #[test]
    fn test_segment_requires_trailing_slash() {
        let table = table();
        // "/openai" alone is not "/openai/..." and must not match.
        assert!(table.match_request(&get("http://gw.local/openai")).is_none());
        assert!(table.match_request(&get("http://gw.local/")).is_none());
        assert!(table
            .match_request(&get("http://gw.local/openais/v1"))
            .is_none());
    }

    #[test]
    fn test_hostname_match_via_uri_authority() {
        let table = table();
        let req = get("http://gooai.chatkit.app/v1beta/models");

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.rule.path_segment, "generativelanguage");
        assert_eq!(matched.kind, MatchKind::Hostname);
    }

    #[test]
    fn test_hostname_match_via_host_header() {
        let table = table();
        let req = Request::builder()
            .uri("/v1beta/models")
            .header("host", "gooai.chatkit.app")
            .body(())
            .unwrap();

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.kind, MatchKind::Hostname);
    }

    #[test]
    fn test_hostname_match_ignores_port_and_case() {
        let table = table();
        let req = Request::builder()
            .uri("/v1beta/models")
            .header("host", "GOOAI.Chatkit.App:8443")
            .body(())
            .unwrap();

        assert!(table.match_request(&req).is_some());
    }

    #[test]
    fn test_path_predicate_beats_hostname_of_later_rule() {
        // A path hit on an earlier rule wins even when a later rule's
        // hostname would also match.
        let rules = vec![
            crate::config::RouteRule {
                path_segment: "first".to_string(),
                target: "https://first.example".to_string(),
                or_hostname: None,
                strip_origin: false,
            },
            crate::config::RouteRule {
                path_segment: "second".to_string(),
                target: "https://second.example".to_string(),
                or_hostname: Some("gw.local".to_string()),
                strip_origin: false,
            },
        ];
        let table = RouteTable::new(rules);
        let req = get("http://gw.local/first/x");

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.rule.path_segment, "first");
        assert_eq!(matched.kind, MatchKind::PathSegment);
    }

    #[test]
    fn test_first_match_wins_on_shared_prefix() {
        let table = table();
        let req = get("http://gw.local/openrouter/api/v1/models");

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.rule.path_segment, "openrouter/api");
    }

    #[test]
    fn test_bare_compound_prefix_falls_to_shorter_rule() {
        let table = table();
        let req = get("http://gw.local/openrouter/v1/models");

        let matched = table.match_request(&req).unwrap();
        assert_eq!(matched.rule.path_segment, "openrouter");
    }

    #[test]
    fn test_rewrite_strips_first_segment() {
        let table = table();
        let req = get("http://gw.local/openai/v1/chat/completions?stream=true");
        let matched = table.match_request(&req).unwrap();

        assert_eq!(
            rewrite_url(&matched, req.uri()),
            "https://api.openai.com/v1/chat/completions?stream=true"
        );
    }

    #[test]
    fn test_rewrite_compound_segment() {
        let table = table();
        let req = get("http://gw.local/openrouter/api/v1/models");
        let matched = table.match_request(&req).unwrap();

        assert_eq!(
            rewrite_url(&matched, req.uri()),
            "https://openrouter.ai/api/v1/models"
        );
    }

    #[test]
    fn test_rewrite_segment_root() {
        let table = table();
        let req = get("http://gw.local/groq/");
        let matched = table.match_request(&req).unwrap();

        assert_eq!(rewrite_url(&matched, req.uri()), "https://api.groq.com/");
    }

    #[test]
    fn test_rewrite_hostname_match_keeps_full_path() {
        let table = table();
        let req = Request::builder()
            .uri("/v1beta/models/gemini:generateContent?key=abc")
            .header("host", "gooai.chatkit.app")
            .body(())
            .unwrap();
        let matched = table.match_request(&req).unwrap();

        assert_eq!(
            rewrite_url(&matched, req.uri()),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini:generateContent?key=abc"
        );
    }

    #[test]
    fn test_rewrite_preserves_encoded_query() {
        let table = table();
        let req = get("http://gw.local/pplx/search?q=a%20b&filter=x%26y");
        let matched = table.match_request(&req).unwrap();

        assert_eq!(
            rewrite_url(&matched, req.uri()),
            "https://api.perplexity.ai/search?q=a%20b&filter=x%26y"
        );
    }

    #[test]
    fn test_rewrite_without_query() {
        let table = table();
        let req = get("http://gw.local/mistral/v1/models");
        let matched = table.match_request(&req).unwrap();

        assert_eq!(
            rewrite_url(&matched, req.uri()),
            "https://api.mistral.ai/v1/models"
        );
    }

    #[test]
    fn test_strip_port_handles_ipv6() {
        assert_eq!(strip_port("example.com:8080"), "example.com");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("[::1]:8080"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
    }

    #[test]
    fn test_table_len() {
        assert_eq!(table().len(), 9);
        assert!(!table().is_empty());
        assert!(RouteTable::new(vec![]).is_empty());
    }
}
