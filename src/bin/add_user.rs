use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::Parser;
use uuid::Uuid;
use worship_board::config;
use worship_board::db;
use worship_board::model::{Identity, Role};

/// Register a team member so they can add songs and receive mail.
#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[arg(long)]
    name: String,

    #[arg(long)]
    nickname: Option<String>,

    #[arg(long)]
    email: String,

    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<NaiveDate>,

    /// Comma-separated roles: admin, leader, minister, member
    #[arg(long, default_value = "member")]
    roles: String,
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

    let mut roles = Vec::new();
    for raw in args.roles.split(',').map(str::trim).filter(|r| !r.is_empty()) {
        match Role::parse_role(raw) {
            Some(role) => roles.push(role),
            None => bail!("unknown role {raw:?}"),
        }
    }
    if args.name.trim().is_empty() || args.email.trim().is_empty() {
        bail!("name and email are required");
    }

    let pool = db::init_pool(&cfg.database_url()).await?;
    db::run_migrations(&pool).await?;

    let who = Identity {
        id: Uuid::new_v4().to_string(),
        name: args.name.trim().to_string(),
        nickname: args.nickname.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        email: args.email.trim().to_string(),
        birth_date: args.birth_date,
        roles,
    };
    db::users::insert(&pool, &who).await?;
    println!("{}", who.id);
    Ok(())
}
