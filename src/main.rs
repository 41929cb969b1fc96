use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use worship_board::api::{build_router, AppState};
use worship_board::{config, db, jobs, mailer};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let mailer = mailer::from_config(&cfg.mail)?;
    let state = AppState::new(pool, cfg.utc_offset(), mailer);

    if cfg.jobs.enabled {
        let handles = jobs::spawn_all(state.jobs.clone(), &cfg.jobs)?;
        info!(jobs = handles.len(), "periodic jobs started");
    } else {
        info!("periodic jobs disabled");
    }

    let app = build_router(state, &cfg.app.allowed_origins);
    let listener = tokio::net::TcpListener::bind(&cfg.app.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.app.bind_addr))?;
    info!(addr = %cfg.app.bind_addr, "starting http server");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;

    Ok(())
}
