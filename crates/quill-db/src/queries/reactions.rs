//! Reaction rows. The unique index on (site, post, key, actor) makes each
//! row a boolean toggle flag, not a counter.

use crate::models::ReactionCount;
use sqlx::PgPool;

/// Remove the actor's flag for this reaction key. Returns whether a row was
/// actually deleted, i.e. whether the actor had the reaction active.
pub async fn delete(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    reaction_key: &str,
    actor_token: &str,
) -> Result<bool, sqlx::Error> {
    let deleted: Option<String> = sqlx::query_scalar(
        r#"
        DELETE FROM reactions
        WHERE site_id = $1 AND post_slug = $2 AND reaction_key = $3 AND actor_token = $4
        RETURNING id
        "#,
    )
    .bind(site_id)
    .bind(post_slug)
    .bind(reaction_key)
    .bind(actor_token)
    .fetch_optional(pool)
    .await?;
    Ok(deleted.is_some())
}

/// Set the actor's flag. ON CONFLICT DO NOTHING keeps a concurrent duplicate
/// toggle from erroring; either writer wins, the row exists once.
pub async fn insert(
    pool: &PgPool,
    id: &str,
    site_id: i64,
    post_slug: &str,
    reaction_key: &str,
    actor_token: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO reactions (id, site_id, post_slug, reaction_key, actor_token)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (site_id, post_slug, reaction_key, actor_token) DO NOTHING
        "#,
    )
    .bind(id)
    .bind(site_id)
    .bind(post_slug)
    .bind(reaction_key)
    .bind(actor_token)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn counts_for_post(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
) -> Result<Vec<ReactionCount>, sqlx::Error> {
    sqlx::query_as::<_, ReactionCount>(
        r#"
        SELECT reaction_key, COUNT(*) AS count
        FROM reactions
        WHERE site_id = $1 AND post_slug = $2
        GROUP BY reaction_key
        "#,
    )
    .bind(site_id)
    .bind(post_slug)
    .fetch_all(pool)
    .await
}

/// Reaction keys the given actor has active on the post.
pub async fn selected_keys(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    actor_token: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT reaction_key
        FROM reactions
        WHERE site_id = $1 AND post_slug = $2 AND actor_token = $3
        "#,
    )
    .bind(site_id)
    .bind(post_slug)
    .bind(actor_token)
    .fetch_all(pool)
    .await
}
