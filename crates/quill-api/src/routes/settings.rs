use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use quill_engine::notify::settings::{self, SettingsPatch, SettingsView};
use serde::Deserialize;

use crate::{error::ApiResult, middleware::auth::require_owner, state::AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sites/{site_id}/notify-settings",
            get(get_settings).put(put_settings),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsQuery {
    include_secret: Option<bool>,
}

async fn get_settings(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    Query(query): Query<SettingsQuery>,
) -> ApiResult<Json<SettingsView>> {
    require_owner(&state, site_id, &headers)?;

    let view = settings::get_settings(
        &state.db,
        &state.settings.server_secret,
        site_id,
        query.include_secret.unwrap_or(false),
    )
    .await?;
    Ok(Json(view))
}

async fn put_settings(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    Json(patch): Json<SettingsPatch>,
) -> ApiResult<Json<SettingsView>> {
    require_owner(&state, site_id, &headers)?;

    let view = settings::upsert_settings(
        &state.db,
        &state.settings.server_secret,
        site_id,
        patch,
    )
    .await?;
    Ok(Json(view))
}
