use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use quill_db::models::SiteNotification;
use quill_engine::notify::{self, ReadSelector};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth::require_owner,
    state::AppState,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sites/{site_id}/notifications",
            get(list_notifications),
        )
        .route(
            "/v1/sites/{site_id}/notifications/read",
            post(mark_read),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationView {
    id: String,
    event_type: String,
    post_slug: String,
    post_title: String,
    actor_name: String,
    actor_site_slug: Option<String>,
    content_preview: Option<String>,
    reaction_key: Option<String>,
    reaction_label: Option<String>,
    target_path: Option<String>,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl From<SiteNotification> for NotificationView {
    fn from(row: SiteNotification) -> Self {
        NotificationView {
            id: row.id,
            event_type: row.event_type,
            post_slug: row.post_slug,
            post_title: row.post_title,
            actor_name: row.actor_name,
            actor_site_slug: row.actor_site_slug,
            content_preview: row.content_preview,
            reaction_key: row.reaction_key,
            reaction_label: row.reaction_label,
            target_path: row.target_path,
            created_at: row.created_at,
            read_at: row.read_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationPageResponse {
    items: Vec<NotificationView>,
    page: i64,
    page_size: i64,
    total: i64,
    total_pages: i64,
    unread: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadRequest {
    all: Option<bool>,
    ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkReadResponse {
    updated: u64,
}

async fn list_notifications(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<NotificationPageResponse>> {
    require_owner(&state, site_id, &headers)?;

    let page = notify::list_notifications(
        &state.db,
        site_id,
        pagination.page.unwrap_or(1),
        pagination.page_size.unwrap_or(0),
    )
    .await?;

    Ok(Json(NotificationPageResponse {
        items: page.items.into_iter().map(NotificationView::from).collect(),
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
        unread: page.unread,
    }))
}

async fn mark_read(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<MarkReadRequest>,
) -> ApiResult<Json<MarkReadResponse>> {
    require_owner(&state, site_id, &headers)?;

    let selector = if payload.all.unwrap_or(false) {
        ReadSelector::All
    } else {
        match payload.ids {
            Some(ids) if !ids.is_empty() => ReadSelector::Ids(ids),
            _ => {
                return Err(ApiError::BadRequest(
                    "expected either all=true or a non-empty ids list".to_string(),
                ))
            }
        }
    };

    let updated = notify::mark_notifications_read(&state.db, site_id, selector).await?;
    Ok(Json(MarkReadResponse { updated }))
}
