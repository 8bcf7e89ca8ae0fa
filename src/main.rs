mod config;
mod db;
mod error;
#[cfg(test)]
mod fixtures;
mod models;
mod repository;
mod response;
mod routes;
mod service;
mod state;
mod storage;

use std::sync::Arc;

use crate::repository::InMemoryRepository;
use crate::storage::LocalFileStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sulsul=info,tower_http=info".into()),
        )
        .init();

    let config = config::Config::from_env()?;
    let config = Arc::new(config);

    storage::ensure_dir(&config.upload_folder)?;
    let files = Arc::new(LocalFileStorage::new(
        config.upload_folder.clone(),
        config.public_base_url.clone(),
    ));

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(pool.as_ref()).await?;
            tracing::info!("Connected to PostgreSQL");
            state::AppState::new(Arc::new(db::PgRepository::new(pool)), files, config.clone())
        }
        None => {
            tracing::warn!("DATABASE_URL not set, essays are kept in memory only");
            let store = Arc::new(InMemoryRepository::new());
            store.seed_demo().await;
            state::AppState::new(store, files, config.clone())
        }
    };

    let app = routes::app(Arc::new(state));

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Sulsul listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
