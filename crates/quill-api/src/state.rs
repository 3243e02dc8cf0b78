use std::sync::Arc;

use quill_core::config::Settings;
use quill_engine::notify::Notifier;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub notifier: Notifier,
    pub settings: Arc<Settings>,
}

#[derive(Debug, Clone)]
pub struct RequestId(pub String);
