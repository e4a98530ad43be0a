//! Rentbook server entry point

use clap::{Parser, Subcommand};
use rentbook_api::{create_router, AppState, LogFormat, ServerConfig};
use rentbook_storage::{MemoryStore, SledStore, Store};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rentbook-server")]
#[command(about = "Rentbook - lease and rental bookkeeping server")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, env = "RENTBOOK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// sled data directory; omit for in-memory storage
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Log format (json or pretty)
        #[arg(long)]
        log_format: Option<LogFormat>,
    },

    /// Print the effective configuration and exit
    Config,
}

fn init_tracing(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

async fn serve<S: Store + 'static>(store: S, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;
    let store = Arc::new(store);
    let state = Arc::new(AppState::new(store.clone(), config));
    let router = create_router(state);

    tracing::info!(%addr, storage = store.name(), "Starting Rentbook server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    store.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            port,
            host,
            data_dir,
            log_format,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if data_dir.is_some() {
                config.data_dir = data_dir;
            }
            if let Some(format) = log_format {
                config.log_format = format;
            }
            config.validate()?;
            init_tracing(&config);

            match &config.data_dir {
                Some(dir) => serve(SledStore::open(dir)?, &config).await?,
                None => {
                    tracing::warn!("No data directory configured, using in-memory storage");
                    serve(MemoryStore::new(), &config).await?
                }
            }
        }

        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
