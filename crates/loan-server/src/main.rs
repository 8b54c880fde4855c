//! HTTP server entry point.

use anyhow::Result;
use clap::Parser;
use loan_server::{PredictionServer, ServerConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Loan approval prediction API",
    long_about = "Serves loan approval predictions over HTTP.\n\n\
                  ENDPOINTS:\n  \
                  POST /api/predict    Score one applicant\n  \
                  GET  /api/health     Health and model status\n\n\
                  EXAMPLES:\n  \
                  loan-server --model-path model.json --port 8080 --cors"
)]
struct Args {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Model bundle to serve
    #[arg(short, long, env = "MODEL_PATH", default_value = loan_server::config::DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Allow cross-origin requests
    #[arg(long)]
    cors: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = ServerConfig::default()
        .with_address(SocketAddr::new(args.host, args.port))
        .with_model_path(args.model_path)
        .with_cors(args.cors);

    let server = PredictionServer::new(config.clone());
    match server.load_model() {
        Ok(()) => info!("Serving model from {}", config.model_path.display()),
        Err(e) => error!("Error loading model: {}", e),
    }

    server.run().await?;
    Ok(())
}
