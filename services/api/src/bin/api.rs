//! The API server binary: loads configuration, wires the Postgres and S3
//! adapters into the web layer, and serves.

use std::sync::Arc;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_lib::adapters::db::PgStore;
use api_lib::adapters::storage::S3Storage;
use api_lib::config::Config;
use api_lib::error::ApiError;
use api_lib::web::docs::ApiDoc;
use api_lib::web::state::AppState;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = PgStore::new(pool);
    store
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(format!("migration failed: {e}")))?;
    info!("database ready");

    let storage = S3Storage::from_env(&config).await;

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("bad ALLOWED_ORIGIN: {e}")))?,
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, COOKIE])
        .allow_credentials(true);

    let bind_address = config.bind_address;
    let state = Arc::new(AppState::new(
        Arc::new(store),
        Arc::new(storage),
        config,
    ));

    let app = api_lib::web::app_router(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("listening on {bind_address}");
    axum::serve(listener, app).await?;
    Ok(())
}
