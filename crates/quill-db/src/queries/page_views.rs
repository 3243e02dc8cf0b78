//! Page-view counters, keyed by (site, resource type, resource key).

use crate::models::PageViewCount;
use sqlx::PgPool;

/// Insert-or-increment, returning the post-increment count. The single
/// upsert statement is what makes concurrent increments lose nothing.
pub async fn increment(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_key: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        INSERT INTO page_views (site_id, resource_type, resource_key, view_count)
        VALUES ($1, $2, $3, 1)
        ON CONFLICT (site_id, resource_type, resource_key) DO UPDATE
        SET view_count = page_views.view_count + 1,
            updated_at = now()
        RETURNING view_count
        "#,
    )
    .bind(site_id)
    .bind(resource_type)
    .bind(resource_key)
    .fetch_one(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_key: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT view_count
        FROM page_views
        WHERE site_id = $1 AND resource_type = $2 AND resource_key = $3
        "#,
    )
    .bind(site_id)
    .bind(resource_type)
    .bind(resource_key)
    .fetch_optional(pool)
    .await
}

/// Batch read for a set of keys. Keys with no row are simply absent from the
/// result; callers default them to zero.
pub async fn get_counts(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_keys: &[String],
) -> Result<Vec<PageViewCount>, sqlx::Error> {
    sqlx::query_as::<_, PageViewCount>(
        r#"
        SELECT resource_key, view_count
        FROM page_views
        WHERE site_id = $1 AND resource_type = $2 AND resource_key = ANY($3)
        "#,
    )
    .bind(site_id)
    .bind(resource_type)
    .bind(resource_keys)
    .fetch_all(pool)
    .await
}
