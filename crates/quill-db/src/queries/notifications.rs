//! Site notification feed.
//!
//! Rows are only ever inserted and bulk-pruned; the single state transition
//! is unread -> read via `read_at`.

use crate::models::SiteNotification;
use sqlx::PgPool;

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    pool: &PgPool,
    id: &str,
    site_id: i64,
    event_type: &str,
    post_slug: &str,
    post_title: &str,
    actor_name: &str,
    actor_site_slug: Option<&str>,
    content_preview: Option<&str>,
    reaction_key: Option<&str>,
    reaction_label: Option<&str>,
    target_path: Option<&str>,
) -> Result<SiteNotification, sqlx::Error> {
    sqlx::query_as::<_, SiteNotification>(
        r#"
        INSERT INTO site_notifications
            (id, site_id, event_type, post_slug, post_title, actor_name,
             actor_site_slug, content_preview, reaction_key, reaction_label, target_path)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id, site_id, event_type, post_slug, post_title, actor_name,
                  actor_site_slug, content_preview, reaction_key, reaction_label,
                  target_path, created_at, read_at
        "#,
    )
    .bind(id)
    .bind(site_id)
    .bind(event_type)
    .bind(post_slug)
    .bind(post_title)
    .bind(actor_name)
    .bind(actor_site_slug)
    .bind(content_preview)
    .bind(reaction_key)
    .bind(reaction_label)
    .bind(target_path)
    .fetch_one(pool)
    .await
}

pub async fn list_page(
    pool: &PgPool,
    site_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<SiteNotification>, sqlx::Error> {
    sqlx::query_as::<_, SiteNotification>(
        r#"
        SELECT id, site_id, event_type, post_slug, post_title, actor_name,
               actor_site_slug, content_preview, reaction_key, reaction_label,
               target_path, created_at, read_at
        FROM site_notifications
        WHERE site_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(site_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, site_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM site_notifications
        WHERE site_id = $1
        "#,
    )
    .bind(site_id)
    .fetch_one(pool)
    .await
}

pub async fn unread_count(pool: &PgPool, site_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM site_notifications
        WHERE site_id = $1 AND read_at IS NULL
        "#,
    )
    .bind(site_id)
    .fetch_one(pool)
    .await
}

/// Mark every unread notification read. The `read_at IS NULL` guard makes
/// re-marking a no-op rather than touching timestamps again.
pub async fn mark_all_read(pool: &PgPool, site_id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE site_notifications
        SET read_at = now()
        WHERE site_id = $1 AND read_at IS NULL
        "#,
    )
    .bind(site_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn mark_read(pool: &PgPool, site_id: i64, ids: &[String]) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE site_notifications
        SET read_at = now()
        WHERE site_id = $1 AND read_at IS NULL AND id = ANY($2)
        "#,
    )
    .bind(site_id)
    .bind(ids)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Keep only the newest `keep` rows for the site. Runs probabilistically
/// from the pipeline, so overlap between concurrent sweeps is harmless.
pub async fn prune_to_recent(pool: &PgPool, site_id: i64, keep: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM site_notifications
        WHERE site_id = $1
          AND id NOT IN (
              SELECT id
              FROM site_notifications
              WHERE site_id = $1
              ORDER BY created_at DESC
              LIMIT $2
          )
        "#,
    )
    .bind(site_id)
    .bind(keep)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
