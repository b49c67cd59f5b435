//! immurest gateway - main entry point
//!
//! Usage:
//!     immurest-gw --backend http://127.0.0.1:3322 --root-cache ./root.json
//!     immurest-gw --backend memory --listen 127.0.0.1:3323

use clap::Parser;
use immurest_gw::config::{Args, BackendTarget, GatewayConfig};
use immurest_gw::root_cache::RootCache;
use immurest_gw::{
    logging, server, GrpcBackend, MemoryBackend, SafeSetBackend, SafeSetHandler, StartupError,
};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_with_filter(&args.log_level);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), StartupError> {
    let config = GatewayConfig::from_args(args)?;

    info!("Initializing immurest gateway");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));

    let backend: Arc<dyn SafeSetBackend> = match &config.backend {
        BackendTarget::Grpc(url) => {
            info!("  Backend: {}", url);
            Arc::new(GrpcBackend::connect_lazy(url, config.timeout)?)
        }
        BackendTarget::Memory => {
            warn!("  Backend: in-memory log (not persistent)");
            Arc::new(MemoryBackend::new())
        }
    };

    let cache = config.root_cache.as_ref().map(RootCache::new);
    let handler = SafeSetHandler::bootstrap(backend, cache).await?;

    info!("Binding {}", config.listen);
    let listener = TcpListener::bind(config.listen).await?;
    info!("Starting immurest gateway on {}", config.listen);

    server::serve(listener, server::router(Arc::new(handler))).await?;

    info!("Gateway shutdown complete");
    Ok(())
}
