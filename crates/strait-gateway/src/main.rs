use clap::Parser;
use strait_gateway::config::Config;
use strait_gateway::proxy::GatewayServer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "strait-gateway",
    about = "Streaming reverse gateway for AI model provider APIs"
)]
struct Args {
    /// Path to a YAML config file. The built-in provider table is used when omitted.
    #[arg(short, long, env = "STRAIT_CONFIG")]
    config: Option<String>,

    /// Override the listen port from the config.
    #[arg(short, long, env = "STRAIT_PORT")]
    port: Option<u16>,

    /// Log filter, e.g. "info" or "strait_gateway=debug".
    #[arg(long, env = "STRAIT_LOG", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }

    info!("Starting strait-gateway on port {}", config.listen.port);

    let server = GatewayServer::new(config)?;
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, exiting");
            Ok(())
        }
    }
}
