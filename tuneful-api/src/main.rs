//! tuneful-api - song catalogue and audio upload service
//!
//! Lists, creates, renames and deletes songs, accepts multipart audio
//! uploads and serves the stored bytes back under `/uploads`.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tuneful_api::{build_router, AppState, UploadDir};
use tuneful_common::config::{
    default_config_file, Overrides, Profile, ServiceConfig, TomlConfig, PROFILE_ENV_VAR,
};
use tuneful_common::db::init_database;

/// Command-line arguments for tuneful-api
#[derive(Parser, Debug)]
#[command(name = "tuneful-api")]
#[command(about = "Song catalogue and audio upload service")]
#[command(version)]
struct Args {
    /// Configuration profile (production or testing)
    #[arg(long, env = PROFILE_ENV_VAR, default_value = "production")]
    profile: Profile,

    /// TOML config file
    #[arg(long, env = "TUNEFUL_CONFIG_FILE")]
    config_file: Option<PathBuf>,

    /// Data root holding the database and upload folder
    #[arg(long, env = "TUNEFUL_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// sqlx database URL
    #[arg(long, env = "TUNEFUL_DATABASE_URL")]
    database_url: Option<String>,

    /// Folder where uploaded files are written
    #[arg(long, env = "TUNEFUL_UPLOAD_FOLDER")]
    upload_folder: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "TUNEFUL_PORT")]
    port: Option<u16>,

    /// Log level when RUST_LOG is unset
    #[arg(long, env = "TUNEFUL_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_file = args.config_file.clone().or_else(default_config_file);
    let toml = match (&config_file, args.profile) {
        (Some(path), Profile::Production) => TomlConfig::load(path)?,
        _ => TomlConfig::default(),
    };

    let overrides = Overrides {
        root_folder: args.root_folder,
        database_url: args.database_url,
        upload_folder: args.upload_folder,
        port: args.port,
        log_level: args.log_level,
    };
    let config = ServiceConfig::resolve(args.profile, &overrides, &toml);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("tuneful_api={0},tuneful_common={0},tower_http={0}", config.log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting tuneful-api v{} ({} profile)",
        env!("CARGO_PKG_VERSION"),
        config.profile
    );
    if let Some(path) = &config_file {
        info!("Config file: {}", path.display());
    }

    let pool = init_database(&config.database_url)
        .await
        .context("Failed to initialize database")?;

    let uploads = UploadDir::new(&config.upload_folder);
    uploads
        .ensure_exists()
        .with_context(|| format!("Failed to create upload folder {}", uploads.root().display()))?;
    info!("Upload folder: {}", uploads.root().display());

    let state = AppState::new(pool, uploads).with_max_upload_bytes(config.max_upload_bytes);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("tuneful-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
