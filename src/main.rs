//! flarepath demonstration server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──TCP──▶ net::listener ──▶ http::server (task per connection)
//!                                            │
//!                                            ▼
//!                                     http::dispatcher
//!                          ┌─────────────────┼──────────────────┐
//!                          ▼                 ▼                  ▼
//!                    http::parser      routing::router    session::store
//!                                            │
//!                          ┌─────────────────┴──────────────────┐
//!                          ▼                                    ▼
//!                  handler (content::*)               http::websocket
//!                          │                                    │
//!     Client ◀─────── http::response ◀──────────────────────────┘
//!
//!     Cross-cutting: config, observability, security, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;

use flarepath::config::resolve_config;
use flarepath::http::handlers::register_demo_routes;
use flarepath::lifecycle::signals::shutdown_signal;
use flarepath::net::listener::Listener;
use flarepath::observability::{logging, metrics};
use flarepath::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "flarepath", version, about = "Embeddable HTTP/1.1 server demo")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address (host:port)
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.bind)?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "flarepath starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        document_root = %config.paths.document_root,
        template_directory = %config.paths.template_directory,
        static_directory = %config.paths.static_directory,
        sessions = config.features.sessions,
        websockets = config.features.websockets,
        rate_limiting = config.features.rate_limiting,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = Listener::bind(&config.listener).await?;
    let server = HttpServer::new(config);
    let demo = register_demo_routes(server.routes(), &server.config().paths);
    tracing::info!(demo_routes = demo, total_routes = server.routes().len(), "Routes registered");

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, receiver).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
