use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use geodemand_core::config::LayeredConfig;
use geodemand_llm::narrator_from_spec;
use geodemand_pipeline::{BatchOrchestrator, PipelineStores};
use geodemand_store::postgres::{PostgresConfig, PostgresStore};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geodemand_api::config::ApiConfig;
use geodemand_api::router::create_router;
use geodemand_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "geodemand_api=info,geodemand_pipeline=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_config = ApiConfig::from_env();
    let config = LayeredConfig::discover().context("Failed to load configuration")?;
    let settings = config.pipeline_settings().context("Invalid pipeline configuration")?;
    let narrator = narrator_from_spec(&config.narrator.value, settings.narrator_timeout)
        .context("Invalid narrator configuration")?;

    tracing::info!(
        port = api_config.port,
        narrator = %config.narrator.value,
        postgres = api_config.uses_postgres(),
        "Starting geodemand API server"
    );

    // Initialize storage backend based on DATABASE_URL environment variable
    let stores = match &api_config.database_url {
        Some(_) => {
            tracing::info!("DATABASE_URL found, connecting to PostgreSQL...");
            let store = init_postgres_storage().await.context(
                "Failed to connect to PostgreSQL. Ensure it is running, that DATABASE_URL \
                 is correct, and that the database exists",
            )?;
            PipelineStores::postgres(store)
        }
        None => {
            tracing::info!("Using in-memory storage (set DATABASE_URL for PostgreSQL)");
            PipelineStores::in_memory()
        }
    };

    let state = Arc::new(AppState::new(BatchOrchestrator::new(stores, narrator, settings)));

    let origin = api_config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", api_config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let app = create_router(state).layer(cors);

    let addr = api_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("CORS enabled for {}", api_config.cors_origin);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

/// Initialize PostgreSQL storage from DATABASE_URL and the pool variables
async fn init_postgres_storage() -> anyhow::Result<PostgresStore> {
    let config = PostgresConfig::from_env().context("Invalid PostgreSQL configuration")?;
    let store = PostgresStore::with_migrations(config).await?;
    Ok(store)
}
