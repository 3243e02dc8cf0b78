pub mod comments;
pub mod health;
pub mod notifications;
pub mod reactions;
pub mod settings;
pub mod views;

use axum::Router;

use crate::state::AppState;

pub fn v1_router(state: AppState) -> Router {
    Router::new()
        .merge(reactions::router(state.clone()))
        .merge(comments::router(state.clone()))
        .merge(views::router(state.clone()))
        .merge(notifications::router(state.clone()))
        .merge(settings::router(state))
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}
