//! VidTube API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use vidtube_core::media::HttpBlobStore;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "vidtube_api_server", about = "VidTube API server")]
struct Args {
    /// Address to bind the HTTP listener on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/vidtube"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vidtube_api=debug,vidtube_core=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    info!(database_url = %args.database_url, bind_addr = %args.bind_addr, "starting vidtube_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    info!("running database migrations");
    vidtube_api::migrate(&pool).await?;

    let mut config = vidtube_api::config::ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.pg_connection_url = args.database_url;

    let blob_store = Arc::new(HttpBlobStore::new(config.blob_store_endpoint.clone()));

    let state = vidtube_api::AppState {
        pool,
        secrets: vidtube_api::config::ApiConfig::token_secrets(),
        blob_store,
        config: config.clone(),
    };

    let app = vidtube_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
