use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use quill_engine::{rate_limit, views};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, extract::client_ip, state::AppState};

const VIEW_WINDOW_MS: i64 = 10_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sites/{site_id}/views/{resource_type}/{resource_key}",
            post(record_view),
        )
        .route("/v1/sites/{site_id}/views/{resource_type}", get(get_counts))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordViewResponse {
    count: i64,
    counted: bool,
}

#[derive(Debug, Deserialize)]
struct CountsQuery {
    /// Comma-separated resource keys.
    keys: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountsResponse {
    counts: HashMap<String, i64>,
}

/// Views are a best-effort vanity metric: a throttled increment still
/// answers 200 with the current count instead of erroring.
async fn record_view(
    State(state): State<AppState>,
    Path((site_id, resource_type, resource_key)): Path<(i64, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<RecordViewResponse>> {
    let ip = client_ip(&headers);

    let key = rate_limit::compose_key(&[
        "view",
        &site_id.to_string(),
        &resource_type,
        &resource_key,
        ip.as_deref().unwrap_or("unknown"),
    ]);
    let decision = rate_limit::consume(
        &state.db,
        &key,
        VIEW_WINDOW_MS,
        state.settings.rate_limit_view_max,
    )
    .await?;

    if !decision.allowed {
        let count = views::current_count(&state.db, site_id, &resource_type, &resource_key).await?;
        return Ok(Json(RecordViewResponse {
            count,
            counted: false,
        }));
    }

    let count = views::increment_view(&state.db, site_id, &resource_type, &resource_key).await?;
    Ok(Json(RecordViewResponse {
        count,
        counted: true,
    }))
}

async fn get_counts(
    State(state): State<AppState>,
    Path((site_id, resource_type)): Path<(i64, String)>,
    Query(query): Query<CountsQuery>,
) -> ApiResult<Json<CountsResponse>> {
    let keys: Vec<String> = query
        .keys
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect();

    let counts = views::view_counts(&state.db, site_id, &resource_type, &keys).await?;
    Ok(Json(CountsResponse { counts }))
}
