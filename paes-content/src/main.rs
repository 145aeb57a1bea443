//! paes-content - content coherence and distribution service

use anyhow::Result;
use clap::Parser;
use paes_common::config::load_config;
use paes_common::db::init_database;
use paes_common::Catalog;
use paes_content::services::HttpExerciseGenerator;
use paes_content::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(name = "paes-content", version, about = "PAES content coherence and distribution service")]
struct Args {
    /// Config file (default: $PAES_CONFIG, then <config dir>/paes/config.toml)
    #[clap(long)]
    config: Option<PathBuf>,

    /// SQLite database path (overrides $PAES_DATABASE and the config file)
    #[clap(long)]
    database: Option<PathBuf>,

    /// HTTP port (overrides the config file)
    #[clap(long)]
    port: Option<u16>,

    /// Bind address
    #[clap(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), args.database.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting PAES content service (paes-content) v{}", env!("CARGO_PKG_VERSION"));

    let catalog = Catalog::load(config.catalog_path.as_deref())?;
    info!("Catalog ready: {} tests", catalog.tests().len());

    info!("Database path: {}", config.database_path.display());
    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let mut state = AppState::new(pool, Arc::clone(&catalog), &config);
    match &config.generator {
        Some(generator_config) => {
            let generator = HttpExerciseGenerator::new(generator_config)?;
            info!("Exercise generator: {}", generator_config.endpoint);
            state = state.with_generator(Arc::new(generator));
        }
        None => warn!("No [generator] configured; /api/distribution/execute is disabled"),
    }

    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("{}:{}", args.host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("paes-content listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
