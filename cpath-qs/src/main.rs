//! Questionnaire Service (cpath-qs) - Main entry point
//!
//! Serves the IB mathematics course questionnaire, scores completed forms
//! and stores each student's recommendation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cpath_common::config::{load_toml_config, resolve_root_folder};
use cpath_common::db::init_database;
use cpath_common::{QuestionBank, TallyScorer};
use cpath_qs::sessions::{start_session_sweeper, SessionExpiry};
use cpath_qs::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cpath-qs
#[derive(Parser, Debug)]
#[command(name = "cpath-qs")]
#[command(about = "IB mathematics course questionnaire service")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "CPATH_QS_PORT")]
    port: Option<u16>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing so its log level can apply
    let (config, config_source) =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any database work
    info!(
        "Starting CoursePath Questionnaire Service (cpath-qs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_source {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => warn!("No config file found, using built-in defaults"),
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &config);
    info!("Root folder: {}", root_folder.display());

    let bank = match config.question_bank_path(&root_folder) {
        Some(path) => {
            info!("Loading question bank from {}", path.display());
            QuestionBank::load(&path)
                .with_context(|| format!("Failed to load question bank {}", path.display()))?
        }
        None => QuestionBank::builtin().context("Built-in question bank is invalid")?,
    };
    let bank = Arc::new(bank);
    info!(
        "Question bank ready: {} sections, {} questions",
        bank.section_count(),
        bank.question_count()
    );

    let mut scorer = TallyScorer::for_bank(&bank);
    if let Some(priority) = &config.scoring.priority {
        scorer = scorer
            .with_priority(priority)
            .context("Invalid [scoring] priority")?;
        info!("Tie-break priority: {:?}", scorer.priority());
    }

    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("✓ Database ready");

    if config.default_admin_credential.is_none() {
        warn!("Using the compiled default admin credential; set default_admin_credential in config");
    }

    let state = AppState::new(pool, bank, config.default_admin_credential())
        .with_scorer(Arc::new(scorer));

    let expiry = SessionExpiry::from_secs(
        config.sessions.idle_timeout_secs,
        config.sessions.submitted_retention_secs,
    );
    start_session_sweeper(
        state.sessions.clone(),
        expiry,
        Duration::from_secs(config.sessions.sweep_interval_secs.max(1)),
    );

    let app = build_router(state);

    let port = args.port.unwrap_or_else(|| config.port());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("cpath-qs listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
            warn!("Failed to listen for Ctrl+C: {}", e);
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
