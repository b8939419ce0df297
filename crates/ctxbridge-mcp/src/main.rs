use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ctxbridge_client::ContextApiClient;
use ctxbridge_core::ContextConfig;
use ctxbridge_mcp::McpServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing. stdout carries the protocol, so console output goes to stderr.
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - standard env filter (default: info for ctxbridge crates)
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "ctxbridge_mcp=info,ctxbridge_client=info,ctxbridge_core=info".into()
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("ctxbridge-mcp.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false)); // no ANSI in files by default
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );

    // Invalid configuration is fatal: report every issue and exit.
    let config = match ContextConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(subsystem = "config", "Configuration validation failed:");
            for issue in e.issues() {
                error!(subsystem = "config", field = issue.field, "- {}", issue);
            }
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let insert_endpoint = config.insert_endpoint.clone();
    let search_endpoint = config.search_endpoint.clone();
    let client = ContextApiClient::new(config)?;
    let server = McpServer::new(Arc::new(client));

    info!("MCP Context Server started successfully");
    info!("Insert endpoint: {}", insert_endpoint);
    info!("Search endpoint: {}", search_endpoint);

    server.run_stdio().await?;

    info!("MCP Context Server stopped");
    Ok(())
}
