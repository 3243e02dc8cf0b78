//! Toggle-style reactions with a fixed vocabulary.

use std::collections::HashMap;

use nanoid::nanoid;
use quill_core::{identity, reactions as vocab};
use quill_db::queries::reactions as reaction_queries;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReactionItem {
    pub key: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
    pub count: i64,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReactionSnapshot {
    pub items: Vec<ReactionItem>,
    pub total: i64,
    pub selected_keys: Vec<String>,
}

/// Flip the actor's flag for one reaction key.
///
/// Returns the new state: true when the reaction was activated, false when
/// it was removed. Activation is the trigger for a notification event;
/// deactivation never notifies (that gating lives with the caller, which
/// owns the pipeline handle).
pub async fn toggle(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    reaction_key: &str,
    actor_token: &str,
) -> Result<bool> {
    if !vocab::is_valid_key(reaction_key) {
        return Err(EngineError::validation(format!(
            "unknown reaction key: {reaction_key}"
        )));
    }
    if !identity::is_valid_token(actor_token) {
        return Err(EngineError::validation("malformed actor token"));
    }
    let post_slug = post_slug.trim();
    if post_slug.is_empty() {
        return Err(EngineError::validation("missing post slug"));
    }

    // Delete-first makes the toggle a single round-trip in both directions;
    // the unique index absorbs concurrent duplicate inserts.
    if reaction_queries::delete(pool, site_id, post_slug, reaction_key, actor_token).await? {
        return Ok(false);
    }

    let id = format!("rct_{}", nanoid!(12));
    reaction_queries::insert(pool, &id, site_id, post_slug, reaction_key, actor_token).await?;
    Ok(true)
}

/// Aggregate counts plus the given actor's active keys, in leaderboard
/// order. An invalid or absent token just reads as "nothing selected".
pub async fn snapshot(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    actor_token: Option<&str>,
) -> Result<ReactionSnapshot> {
    let post_slug = post_slug.trim();
    if post_slug.is_empty() {
        return Err(EngineError::validation("missing post slug"));
    }

    let counts: HashMap<String, i64> = reaction_queries::counts_for_post(pool, site_id, post_slug)
        .await?
        .into_iter()
        .map(|row| (row.reaction_key, row.count))
        .collect();

    let selected = match actor_token.filter(|t| identity::is_valid_token(t)) {
        Some(token) => reaction_queries::selected_keys(pool, site_id, post_slug, token).await?,
        None => Vec::new(),
    };

    Ok(build_snapshot(&counts, &selected))
}

/// Pure presentation ordering: every preset appears once, sorted by count
/// descending with ties broken by declaration order. Deterministic for equal
/// counts, never alphabetical.
fn build_snapshot(counts: &HashMap<String, i64>, selected: &[String]) -> ReactionSnapshot {
    let mut items: Vec<ReactionItem> = vocab::PRESETS
        .iter()
        .map(|preset| ReactionItem {
            key: preset.key,
            icon: preset.icon,
            label: preset.label,
            count: counts.get(preset.key).copied().unwrap_or(0),
            selected: selected.iter().any(|k| k == preset.key),
        })
        .collect();

    items.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| vocab::position(a.key).cmp(&vocab::position(b.key)))
    });

    let total = items.iter().map(|item| item.count).sum();
    let selected_keys = items
        .iter()
        .filter(|item| item.selected)
        .map(|item| item.key.to_string())
        .collect();

    ReactionSnapshot {
        items,
        total,
        selected_keys,
    }
}
