use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware::from_fn, Router};
use quill_core::config::Settings;
use quill_engine::notify::Notifier;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod extract;
mod middleware;
mod routes;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&settings.database_url)
        .await?;

    quill_db::schema::ensure_schema(&db).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let notifier = Notifier::new(
        db.clone(),
        http,
        settings.server_secret.clone(),
        settings.telegram_api_base.clone(),
    );

    let state = AppState {
        db,
        notifier,
        settings: Arc::new(settings),
    };

    let app = Router::new()
        .merge(routes::health_router(state.clone()))
        .merge(routes::v1_router(state.clone()))
        .layer(from_fn(middleware::request_id::request_id));

    let addr: SocketAddr = state.settings.api_bind.parse()?;

    info!(%addr, env = %state.settings.quill_env, "starting api");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
