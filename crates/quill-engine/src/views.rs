//! Page-view counters. Best-effort vanity metric: throttled or failed
//! increments degrade to reads, they never fail a page load.

use std::collections::HashMap;

use quill_db::queries::page_views;
use sqlx::PgPool;

/// Anything that is not the home page counts as a post view.
pub fn normalize_resource_type(raw: &str) -> &'static str {
    if raw == "home" {
        "home"
    } else {
        "post"
    }
}

/// Insert-or-increment, returning the post-increment count. An empty
/// resolved key is a no-op returning 0 so callers never crash on a missing
/// slug.
pub async fn increment_view(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_key: &str,
) -> Result<i64, sqlx::Error> {
    let resource_type = normalize_resource_type(resource_type);
    let resource_key = resource_key.trim();
    if resource_key.is_empty() {
        return Ok(0);
    }
    page_views::increment(pool, site_id, resource_type, resource_key).await
}

/// Current count without incrementing; used when the increment was
/// throttled. Missing row reads as 0.
pub async fn current_count(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_key: &str,
) -> Result<i64, sqlx::Error> {
    let resource_type = normalize_resource_type(resource_type);
    let resource_key = resource_key.trim();
    if resource_key.is_empty() {
        return Ok(0);
    }
    Ok(page_views::get(pool, site_id, resource_type, resource_key)
        .await?
        .unwrap_or(0))
}

/// Batch read; keys with no recorded views are absent from the map and
/// default to 0 on the caller's side.
pub async fn view_counts(
    pool: &PgPool,
    site_id: i64,
    resource_type: &str,
    resource_keys: &[String],
) -> Result<HashMap<String, i64>, sqlx::Error> {
    let resource_type = normalize_resource_type(resource_type);
    if resource_keys.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = page_views::get_counts(pool, site_id, resource_type, resource_keys).await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.resource_key, row.view_count))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    // Lazy pool never connects, so these tests prove the early returns
    // issue no queries at all.
    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[test]
    fn test_resource_type_normalization() {
        assert_eq!(normalize_resource_type("home"), "home");
        assert_eq!(normalize_resource_type("post"), "post");
        assert_eq!(normalize_resource_type("anything-else"), "post");
        assert_eq!(normalize_resource_type(""), "post");
    }

    #[test]
    fn test_empty_key_is_noop() {
        rt().block_on(async {
            let pool = lazy_pool();
            assert_eq!(increment_view(&pool, 1, "post", "").await.unwrap(), 0);
            assert_eq!(increment_view(&pool, 1, "post", "   ").await.unwrap(), 0);
            assert_eq!(current_count(&pool, 1, "home", "").await.unwrap(), 0);
        });
    }

    #[test]
    fn test_empty_batch_skips_query() {
        rt().block_on(async {
            let pool = lazy_pool();
            let counts = view_counts(&pool, 1, "post", &[]).await.unwrap();
            assert!(counts.is_empty());
        });
    }
}
