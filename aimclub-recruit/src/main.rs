//! aimclub-recruit - A.I.M. Club recruitment service
//!
//! Serves the application intake, tracking and admin APIs over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aimclub_common::api::load_shared_secret;
use aimclub_common::config::ClubConfig;
use aimclub_common::db::init_database;
use aimclub_recruit::notify::{FormSubmitNotifier, LogNotifier, Notifier};
use aimclub_recruit::{build_router, AppState};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for aimclub-recruit
#[derive(Parser, Debug)]
#[command(name = "aimclub-recruit")]
#[command(about = "Recruitment service for the A.I.M. Club")]
#[command(version)]
struct Args {
    /// Config file (overrides AIMCLUB_CONFIG and the platform config file)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, env = "AIMCLUB_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "AIMCLUB_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aimclub_recruit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any slow startup work
    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();

    let mut config = ClubConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }

    info!("Database path: {}", config.database_path.display());
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let shared_secret = load_shared_secret(&pool)
        .await
        .context("Failed to load API shared secret")?;
    if shared_secret == 0 {
        warn!("API authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for API authentication");
    }
    if config.master_key.is_none() {
        info!("No master key configured; admin login only via one-time access code");
    }

    let notifier: Arc<dyn Notifier> = if config.notifier.enabled {
        Arc::new(
            FormSubmitNotifier::new(
                &config.notifier.endpoint,
                &config.admin_email,
                Duration::from_secs(config.notifier.timeout_secs.max(1)),
            )
            .context("Failed to create email relay client")?,
        )
    } else {
        info!("Email delivery disabled; notifications will be logged only");
        Arc::new(LogNotifier)
    };

    let state = AppState::with_pool(pool, notifier, &config, shared_secret);

    let _change_log = state.events.on_application_changed(|change| async move {
        debug!(
            applicant_id = %change.applicant_id,
            change = ?change.change,
            status = %change.status,
            "Application change published"
        );
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("aimclub-recruit listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
