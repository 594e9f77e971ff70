//! `deskd` — the Schooldesk server binary.
//!
//! Usage:
//!   deskd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/schooldesk/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use jsonwebtoken::{DecodingKey, Validation};
use tracing::info;

use desk_core::{Clock, Module, SystemClock};

use auth_middleware::JwtState;
use config::ServerConfig;

/// Schooldesk server.
#[derive(Parser, Debug)]
#[command(name = "deskd", about = "Schooldesk server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let sql: Arc<dyn desk_sql::SQLStore> = Arc::new(
        desk_sql::SqliteStore::open(&data_dir.join("schooldesk.db"))
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {e}"))?,
    );
    let blob: Arc<dyn desk_blob::BlobStore> = Arc::new(
        desk_blob::FileStore::open(&data_dir.join("blob"))
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {e}"))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Initialize modules.
    let auth_module = auth::AuthModule::new(
        Arc::clone(&sql),
        Arc::clone(&clock),
        auth::TokenConfig {
            secret: server_config.jwt.secret.clone(),
            expire_secs: server_config.jwt.expire_secs,
        },
    )?;
    info!("Auth module initialized");

    // Seed administrator from config on first start.
    bootstrap::ensure_admin(auth_module.service().store(), &server_config)?;

    let helpdesk_module = helpdesk::HelpdeskModule::new(
        Arc::clone(&sql),
        Arc::clone(&blob),
        Arc::clone(&clock),
    )?;
    info!("Helpdesk module initialized");

    let dispatch_module = dispatch::DispatchModule::new(Arc::clone(&sql), Arc::clone(&clock))?;
    info!("Dispatch module initialized");

    let signup_module = signup::SignupModule::new(Arc::clone(&sql), Arc::clone(&clock))?;
    info!("Signup module initialized");

    let module_routes = vec![
        (auth_module.name(), auth_module.routes()),
        (helpdesk_module.name(), helpdesk_module.routes()),
        (dispatch_module.name(), dispatch_module.routes()),
        (signup_module.name(), signup_module.routes()),
    ];

    let jwt_state = Arc::new(JwtState {
        decoding_key: DecodingKey::from_secret(server_config.jwt.secret.as_bytes()),
        validation: Validation::default(),
    });

    let app = routes::build_router(jwt_state, module_routes);

    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("Schooldesk server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
