use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use quill_core::events::{EventKind, NotificationEvent};
use quill_core::identity;
use quill_engine::rate_limit;
use quill_engine::reactions::{self, ReactionSnapshot};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult},
    extract::{client_ip, site_origin, user_agent},
    state::AppState,
};

const TOGGLE_WINDOW_MS: i64 = 60_000;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/sites/{site_id}/posts/{slug}/reactions",
            get(get_snapshot),
        )
        .route(
            "/v1/sites/{site_id}/posts/{slug}/reactions/toggle",
            post(toggle_reaction),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleReactionRequest {
    reaction_key: String,
    actor_token: Option<String>,
    post_title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleReactionResponse {
    active: bool,
    actor_token: String,
    should_set_cookie: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotQuery {
    actor_token: Option<String>,
}

async fn toggle_reaction(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(i64, String)>,
    headers: HeaderMap,
    Json(payload): Json<ToggleReactionRequest>,
) -> ApiResult<Json<ToggleReactionResponse>> {
    let ip = client_ip(&headers);

    let key = rate_limit::compose_key(&[
        "reaction",
        &site_id.to_string(),
        ip.as_deref().unwrap_or("unknown"),
    ]);
    let decision = rate_limit::consume(
        &state.db,
        &key,
        TOGGLE_WINDOW_MS,
        state.settings.rate_limit_reaction_max,
    )
    .await?;
    if !decision.allowed {
        return Err(ApiError::RateLimited {
            retry_after_ms: decision.retry_after_ms,
        });
    }

    let actor = identity::resolve(
        ip.as_deref(),
        &user_agent(&headers),
        payload.actor_token.as_deref(),
        &state.settings.server_secret,
    );

    let active = reactions::toggle(
        &state.db,
        site_id,
        &slug,
        &payload.reaction_key,
        &actor.token,
    )
    .await?;

    // Only activation notifies; un-reacting is silent.
    if active {
        state.notifier.enqueue(
            site_id,
            NotificationEvent {
                kind: EventKind::Reaction,
                post_slug: slug.clone(),
                post_title: payload.post_title.unwrap_or_else(|| slug.clone()),
                actor_name: "A visitor".to_string(),
                actor_site_slug: None,
                content_preview: None,
                reaction_key: Some(payload.reaction_key.clone()),
                site_origin: site_origin(&headers),
                target_path: Some(format!("/{slug}")),
            },
        );
    }

    Ok(Json(ToggleReactionResponse {
        active,
        actor_token: actor.token,
        should_set_cookie: actor.should_set_cookie,
    }))
}

async fn get_snapshot(
    State(state): State<AppState>,
    Path((site_id, slug)): Path<(i64, String)>,
    Query(query): Query<SnapshotQuery>,
) -> ApiResult<Json<ReactionSnapshot>> {
    let snapshot =
        reactions::snapshot(&state.db, site_id, &slug, query.actor_token.as_deref()).await?;
    Ok(Json(snapshot))
}
