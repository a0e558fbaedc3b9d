//! Route table configuration.
//!
//! Each rule maps a leading path segment (or an entire hostname) to an
//! upstream base URL. The table is scanned in order and the first matching
//! rule wins.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteRule {
    /// Path segment that selects this rule when the request path starts with
    /// `/{path_segment}/`. May itself contain a slash (`openrouter/api`).
    pub path_segment: String,

    /// Upstream base URL, scheme included, no trailing slash.
    pub target: String,

    /// Alternate hostname that selects this rule regardless of the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or_hostname: Option<String>,

    /// Drop the `origin` header before forwarding. Some providers reject
    /// requests that look like cross-origin browser traffic.
    #[serde(default)]
    pub strip_origin: bool,
}

impl RouteRule {
    /// Validate a single rule.
    pub fn validate(&self) -> Result<(), String> {
        if self.path_segment.is_empty() {
            return Err("route rule has an empty 'path_segment'".to_string());
        }
        if self.path_segment.starts_with('/') || self.path_segment.ends_with('/') {
            return Err(format!(
                "path_segment '{}' must not start or end with '/'",
                self.path_segment
            ));
        }
        if !self.target.starts_with("http://") && !self.target.starts_with("https://") {
            return Err(format!(
                "target '{}' for segment '{}' must be an absolute http(s) URL",
                self.target, self.path_segment
            ));
        }
        if self.target.ends_with('/') {
            return Err(format!(
                "target '{}' must not end with '/' (the rewritten path supplies it)",
                self.target
            ));
        }
        if let Some(ref hostname) = self.or_hostname {
            if hostname.is_empty() || hostname.contains('/') {
                return Err(format!(
                    "or_hostname '{hostname}' must be a bare hostname"
                ));
            }
        }
        Ok(())
    }
}

fn rule(path_segment: &str, target: &str) -> RouteRule {
    RouteRule {
        path_segment: path_segment.to_string(),
        target: target.to_string(),
        or_hostname: None,
        strip_origin: false,
    }
}

/// Built-in table of AI model providers, used when the config omits `routes`.
pub fn default_route_table() -> Vec<RouteRule> {
    vec![
        RouteRule {
            or_hostname: Some("gooai.chatkit.app".to_string()),
            ..rule(
                "generativelanguage",
                "https://generativelanguage.googleapis.com",
            )
        },
        rule("groq", "https://api.groq.com"),
        RouteRule {
            strip_origin: true,
            ..rule("anthropic", "https://api.anthropic.com")
        },
        rule("pplx", "https://api.perplexity.ai"),
        rule("openai", "https://api.openai.com"),
        rule("mistral", "https://api.mistral.ai"),
        // The compound segment must come before the bare one so it wins.
        rule("openrouter/api", "https://openrouter.ai/api"),
        rule("openrouter", "https://openrouter.ai/api"),
        rule("xai", "https://api.x.ai"),
    ]
}
