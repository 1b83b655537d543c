use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use service::auth::TokenService;
use service::dispatch::Dispatcher;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenService>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, cfg: &configs::AppConfig) -> anyhow::Result<Self> {
        let tokens = TokenService::new(
            &cfg.auth.jwt_secret,
            &cfg.auth.encrypt_secret,
            cfg.auth.token_ttl_secs,
        )
        .map_err(|e| anyhow::anyhow!("token service init failed: {e}"))?;
        let dispatcher = Dispatcher::new(Duration::from_secs(cfg.dispatch.timeout_secs))?;
        Ok(Self {
            db,
            tokens: Arc::new(tokens),
            dispatcher: Arc::new(dispatcher),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    crate::routes::router(state)
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    common::utils::logging::init_logging_default();

    let cfg = configs::AppConfig::load_and_validate().context("invalid configuration")?;

    let db = models::db::connect_with(&cfg.database)
        .await
        .context("database connection failed")?;
    migration::Migrator::up(&db, None)
        .await
        .context("migrations failed")?;

    let state = AppState::new(db, &cfg)?;
    let app = build_router(state);

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
