//! Gateway server: owns the listener, the shared route table, and the
//! upstream client, and runs the HTTP/1.1 accept loop.

use super::client::{create_http_client, HttpClient};
use super::handler::{handle_request, RequestHandlerContext};
use super::network::create_reusable_listener;
use super::routes::RouteTable;
use crate::config::Config;
use crate::metrics::collect_metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// The gateway process: one listener, one compiled route table, one shared
/// upstream client.
pub struct GatewayServer {
    config: Arc<Config>,
    routes: Arc<RouteTable>,
    http_client: HttpClient,
}

impl GatewayServer {
    pub fn new(config: Config) -> Result<Self, anyhow::Error> {
        config.validate()?;
        let routes = Arc::new(RouteTable::new(config.routes.clone()));
        let http_client = create_http_client(&config);
        Ok(Self {
            config: Arc::new(config),
            routes,
            http_client,
        })
    }

    /// Bind the configured ports and serve until the process is stopped.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.listen.port));
        let listener = create_reusable_listener(addr)?;

        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], self.config.metrics.port));
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(metrics_addr).await {
                error!("Metrics listener failed: {}", e);
            }
        });

        self.run_on(listener).await
    }

    /// Serve requests on an already-bound listener.
    ///
    /// Tests bind an ephemeral port themselves and hand it in here, skipping
    /// the metrics listener.
    pub async fn run_on(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("Gateway listening on {}", listener.local_addr()?);
        info!("Route table: {} rules", self.routes.len());
        info!(
            "Forward deadline: {}ms (response head only)",
            self.config.forward.timeout_ms
        );

        let server = Arc::new(self);
        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let server = Arc::clone(&server);

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let service = service_fn(move |req| {
                    let server = Arc::clone(&server);
                    async move { server.handle_request_internal(req).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Connection from {} ended with error: {}", remote_addr, e);
                }
            });
        }
    }

    async fn handle_request_internal(
        &self,
        req: Request<hyper::body::Incoming>,
    ) -> Result<Response<super::forwarding::ProxyBody>, Infallible> {
        let ctx = RequestHandlerContext {
            http_client: &self.http_client,
            routes: &self.routes,
            forward_timeout: Duration::from_millis(self.config.forward.timeout_ms),
        };
        handle_request(&ctx, req).await
    }
}

/// Serve the Prometheus scrape endpoint on its own port.
async fn serve_metrics(addr: SocketAddr) -> Result<(), anyhow::Error> {
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics listening on {}", addr);

    loop {
        let (stream, _) = listener.accept().await?;
        tokio::spawn(async move {
            let io = TokioIo::new(stream);
            let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                let response = if req.uri().path() == "/metrics" {
                    Response::builder()
                        .status(StatusCode::OK)
                        .header("content-type", "text/plain; version=0.0.4")
                        .body(Full::new(Bytes::from(collect_metrics())))
                        .unwrap()
                } else {
                    Response::builder()
                        .status(StatusCode::NOT_FOUND)
                        .body(Full::new(Bytes::from("not found")))
                        .unwrap()
                };
                Ok::<_, Infallible>(response)
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Metrics connection error: {}", e);
            }
        });
    }
}
