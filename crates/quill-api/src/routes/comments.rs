use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use quill_core::events::{EventKind, NotificationEvent};
use quill_db::models::Comment;
use quill_engine::{comments, rate_limit};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    extract::{client_ip, site_origin},
    middleware::auth::require_owner,
    state::AppState,
};

const POST_WINDOW_MS: i64 = 300_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sites/{site_id}/posts/{slug}/comments",
            post(create_comment).get(list_comments),
        )
        .route(
            "/v1/sites/{site_id}/comments/{id}",
            delete(delete_comment),
        )
        .route("/v1/sites/{site_id}/comments/move", post(move_comments))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCommentRequest {
    author_name: String,
    author_site_slug: Option<String>,
    content: String,
    post_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentView {
    id: String,
    post_slug: String,
    author_name: String,
    author_site_slug: Option<String>,
    content: String,
    created_at: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        CommentView {
            id: comment.id,
            post_slug: comment.post_slug,
            author_name: comment.author_name,
            author_site_slug: comment.author_site_slug,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentPageResponse {
    items: Vec<CommentView>,
    page: i64,
    page_size: i64,
    total: i64,
    total_pages: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Pagination {
    page: Option<i64>,
    page_size: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCommentsRequest {
    from_slug: String,
    to_slug: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveCommentsResponse {
    moved: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteCommentResponse {
    deleted: bool,
}

async fn create_comment(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(i64, String)>,
    headers: HeaderMap,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<Json<CommentView>> {
    let ip = client_ip(&headers);

    let key = rate_limit::compose_key(&[
        "comment",
        &site_id.to_string(),
        ip.as_deref().unwrap_or("unknown"),
    ]);
    let decision = rate_limit::consume(
        &state.db,
        &key,
        POST_WINDOW_MS,
        state.settings.rate_limit_comment_max,
    )
    .await?;
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    let comment = comments::create(
        &state.db,
        site_id,
        &slug,
        &payload.author_name,
        payload.author_site_slug.as_deref(),
        &payload.content,
    )
    .await?;

    state.notifier.enqueue(
        site_id,
        NotificationEvent {
            kind: EventKind::Comment,
            post_slug: slug.clone(),
            post_title: payload.post_title.unwrap_or_else(|| slug.clone()),
            actor_name: comment.author_name.clone(),
            actor_site_slug: comment.author_site_slug.clone(),
            content_preview: Some(comment.content.clone()),
            reaction_key: None,
            site_origin: site_origin(&headers),
            target_path: Some(format!("/{slug}#comments")),
        },
    );

    Ok(Json(comment.into()))
}

async fn list_comments(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(i64, String)>,
    Query(pagination): Query<Pagination>,
) -> ApiResult<Json<CommentPageResponse>> {
    let page = comments::list(
        &state.db,
        site_id,
        &slug,
        pagination.page.unwrap_or(1),
        pagination.page_size.unwrap_or(0),
    )
    .await?;

    Ok(Json(CommentPageResponse {
        items: page.items.into_iter().map(CommentView::from).collect(),
        page: page.page,
        page_size: page.page_size,
        total: page.total,
        total_pages: page.total_pages,
    }))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((site_id, id)): Path<(i64, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<DeleteCommentResponse>> {
    require_owner(&state, site_id, &headers)?;

    let deleted = comments::delete(&state.db, site_id, &id).await?;
    if !deleted {
        return Err(ApiError::NotFound("comment not found".to_string()));
    }
    Ok(Json(DeleteCommentResponse { deleted }))
}

async fn move_comments(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    Json(payload): Json<MoveCommentsRequest>,
) -> ApiResult<Json<MoveCommentsResponse>> {
    require_owner(&state, site_id, &headers)?;

    let moved =
        comments::move_to_post(&state.db, site_id, &payload.from_slug, &payload.to_slug).await?;
    Ok(Json(MoveCommentsResponse { moved }))
}
