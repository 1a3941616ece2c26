//! fleet-api - drone fleet maintenance service
//!
//! Zero-config startup: root folder from CLI, FLEET_ROOT, config file or
//! the platform default; SQLite database created on first run.

use anyhow::{Context, Result};
use clap::Parser;
use fleet_api::{build_router, AppState};
use fleet_common::config::{ensure_root_folder, resolve_root_folder, ServerConfig, ROOT_FOLDER_ENV};
use fleet_common::db::init::init_database;
use fleet_common::db::sessions::LogChallengeSender;
use fleet_common::db::users::grant_owner;
use fleet_common::db::WriteContext;
use fleet_common::ids::UuidV7Ids;
use fleet_common::time::{Clock, SystemClock};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "fleet-api")]
#[command(about = "Drone fleet maintenance tracking service")]
#[command(version)]
struct Args {
    /// Root folder holding config.toml and the database
    #[arg(short, long)]
    root_folder: Option<String>,

    /// Socket address to listen on (overrides PORT and config.toml)
    #[arg(short, long)]
    bind: Option<String>,

    /// Create or promote this user to owner before serving
    #[arg(long, value_name = "EMAIL")]
    grant_owner: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting fleet-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV);
    ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let config = ServerConfig::load(&root_folder)?;
    let db_path = config.database_path(&root_folder);

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Database ready: {}", db_path.display());
            pool
        }
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let ids = Arc::new(UuidV7Ids);
    let clock = Arc::new(SystemClock);

    if let Some(email) = args.grant_owner.as_deref() {
        let owner = grant_owner(&pool, WriteContext::new(ids.as_ref(), clock.unix_now()), email)
            .await
            .with_context(|| format!("granting owner role to {}", email))?;
        info!("User {} ({}) is an owner", owner.email, owner.id);
    }

    let bind_address = args
        .bind
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .filter(|p| !p.is_empty())
                .map(|p| format!("0.0.0.0:{}", p))
        })
        .unwrap_or_else(|| config.bind_address.clone());

    let sender = Arc::new(LogChallengeSender {
        verify_url: format!("http://{}/api/v1/auth/session/verify", bind_address),
    });

    let state = AppState::new(
        pool,
        ids,
        clock,
        sender,
        config.challenge_ttl_minutes * 60,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("binding {}", bind_address))?;
    info!("fleet-api listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
