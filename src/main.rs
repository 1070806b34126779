use std::sync::Arc;

use program_match_api::{
    config::{Config, DataSourceKind},
    db,
    routes::{create_router, AppState},
    services::{
        providers::{CatalogSource, MemorySource, PostgresSource, RestSource, UserDataSource},
        RecommendationEngine,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("program_match_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let (catalog, users): (Arc<dyn CatalogSource>, Arc<dyn UserDataSource>) =
        match config.data_source {
            DataSourceKind::Memory => {
                let source = Arc::new(MemorySource::from_json_file(&config.catalog_path)?);
                (
                    source.clone() as Arc<dyn CatalogSource>,
                    source as Arc<dyn UserDataSource>,
                )
            }
            DataSourceKind::Postgres => {
                let pool = db::create_pool(&config.database_url).await?;
                db::run_migrations(&pool).await?;
                let source = Arc::new(PostgresSource::new(pool));
                (
                    source.clone() as Arc<dyn CatalogSource>,
                    source as Arc<dyn UserDataSource>,
                )
            }
            DataSourceKind::Rest => {
                let (url, key) = config.rest_credentials()?;
                let source = Arc::new(RestSource::new(url, key));
                (
                    source.clone() as Arc<dyn CatalogSource>,
                    source as Arc<dyn UserDataSource>,
                )
            }
        };

    tracing::info!(source = catalog.name(), "Data source configured");

    let state = AppState::new(RecommendationEngine::new(catalog, users));
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
