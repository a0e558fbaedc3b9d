//! Gateway module.
//!
//! This module provides the reverse gateway implementation with support for:
//! - Ordered first-match route table (path segment or hostname predicates)
//! - Streaming passthrough of request and response bodies
//! - Bounded forwarding (deadline on the response head only)
//! - Ad-hoc forwarding to a caller-supplied URL
//! - CORS preflight handling and cross-origin response headers
//!
//! # Module Structure
//!
//! - `server` - GatewayServer struct and main run loop
//! - `handler` - Request dispatch and route forwarding
//! - `routes` - Route table matching and upstream URL rewriting
//! - `forwarding` - Bounded and unbounded forwards to upstreams
//! - `adhoc` - The caller-addressed forwarding endpoint
//! - `client` - HTTP client creation and configuration
//! - `headers` - Header policy and shared header names
//! - `network` - Network listener utilities (SO_REUSEPORT)

mod adhoc;
mod client;
mod forwarding;
mod handler;
mod headers;
mod network;
mod routes;
mod server;


// Re-export public API types
// These are used by main.rs and the integration tests
#[allow(unused_imports)]
pub use forwarding::{error_response, text_response, ForwardError, ProxyBody};
#[allow(unused_imports)]
pub use handler::{handle_request, RequestHandlerContext, RouteOutcome};
#[allow(unused_imports)]
pub use network::create_reusable_listener;
#[allow(unused_imports)]
pub use routes::{rewrite_url, MatchKind, RouteTable};
#[allow(unused_imports)]
pub use server::GatewayServer;
