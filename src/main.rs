use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warfare_counselor::config::AppConfig;
use warfare_counselor::database::Database;
use warfare_counselor::{build_router, AppState};

#[derive(Parser)]
#[command(name = "warfare-counselor")]
#[command(about = "Strategic counselor chat service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the bind host
        #[arg(long)]
        host: Option<String>,

        /// Override the bind port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply database migrations and exit
    Migrate {
        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warfare_counselor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Commands::Serve { config, host, port } => serve(config, host, port).await,
        Commands::Migrate { config } => migrate(config).await,
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Database> {
    let database = Database::new(&config.database.url, config.database.max_connections)
        .await
        .context("failed to open database")?;
    info!("Database connected");

    database
        .run_migrations()
        .await
        .context("failed to run migrations")?;
    info!("Database migrations completed");
    Ok(database)
}

async fn serve(
    config_path: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    info!("Starting Warfare Counselor");

    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;
    info!("Configuration loaded");

    let database = connect(&config).await?;
    let addr = config.bind_address();
    let state = AppState::from_config(config, database)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn migrate(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    connect(&config).await?;
    info!("Migrations applied to {}", config.database.url);
    Ok(())
}
