//! klimat service binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use klimat::config::{Loader, Overrides};
use klimat::store::Store;
use klimat::{Router, seed, server};

/// Microclimate data service.
#[derive(Debug, Parser)]
#[command(name = "klimat", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind.
    #[arg(long)]
    port: Option<u16>,

    /// Database URL (file path, `:memory:`, or libsql://).
    #[arg(long)]
    database_url: Option<String>,

    /// JWT signing secret (at least 32 bytes).
    #[arg(long)]
    jwt_secret: Option<String>,

    /// Load the demo dataset on startup.
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> klimat::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Loader::default().load(
        cli.config.as_deref(),
        Overrides {
            host: cli.host,
            port: cli.port,
            database_url: cli.database_url,
            jwt_secret: cli.jwt_secret,
        },
    )?;

    let db = Arc::new(klimat::db::connect(&config.database.url).await?);
    let store = Store::new(Arc::clone(&db));
    store.init_schema().await?;
    if cli.seed_demo {
        let data = seed::demo(&store).await?;
        tracing::info!(
            "Demo users: admin={} project_reader={} building_reader={} manager={}",
            data.admin,
            data.project_reader,
            data.building_reader,
            data.manager
        );
    }

    let mut router = Router::new();
    for module in klimat::api_modules() {
        tracing::debug!("Registering module {}", module.name());
        module.routes(&mut router);
    }

    server::run(config, Some(db), router.into_handle()).await
}
