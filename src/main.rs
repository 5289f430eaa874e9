use anyhow::Context;
use tracing_subscriber::fmt::writer::MakeWriterExt;

use resume_intake::api::{AppState, api_routes};
use resume_intake::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize tracing; the guard flushes the log file on exit.
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    let _log_guard = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "resume-intake.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_writer(std::io::stderr.and(file_writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .init();
            None
        }
    };

    eprintln!("📄 Resume Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);

    // ── Question flow + database ─────────────────────────────────────────
    let state = AppState::from_config(&config)
        .await
        .with_context(|| format!("failed to start with database at {}", config.db_path.display()))?;
    eprintln!("   Steps: {}", state.engine.registry().len());
    eprintln!("   Database: {}", config.db_path.display());

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = api_routes(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Resume API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
