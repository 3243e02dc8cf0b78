//! Append-only comments with clamped pagination.

use nanoid::nanoid;
use quill_db::models::Comment;
use quill_db::queries::comments as comment_queries;
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{EngineError, Result};
use crate::pagination::{clamp_page, clamp_page_size};

pub const MAX_AUTHOR_CHARS: usize = 60;
pub const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, Clone, Serialize)]
pub struct CommentPage {
    pub items: Vec<Comment>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

pub async fn create(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    author_name: &str,
    author_site_slug: Option<&str>,
    content: &str,
) -> Result<Comment> {
    let post_slug = post_slug.trim();
    if post_slug.is_empty() {
        return Err(EngineError::validation("missing post slug"));
    }
    let author_name = author_name.trim();
    if author_name.is_empty() {
        return Err(EngineError::validation("author name is required"));
    }
    if author_name.chars().count() > MAX_AUTHOR_CHARS {
        return Err(EngineError::validation("author name too long"));
    }
    let content = content.trim();
    if content.is_empty() {
        return Err(EngineError::validation("comment is empty"));
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(EngineError::validation("comment too long"));
    }
    let author_site_slug = author_site_slug
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let id = format!("cmt_{}", nanoid!(12));
    let comment = comment_queries::insert(
        pool,
        &id,
        site_id,
        post_slug,
        author_name,
        author_site_slug,
        content,
    )
    .await?;
    Ok(comment)
}

pub async fn list(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    page: i64,
    page_size: i64,
) -> Result<CommentPage> {
    let post_slug = post_slug.trim();
    let page_size = clamp_page_size(page_size);
    let total = comment_queries::count_for_post(pool, site_id, post_slug).await?;
    let (page, total_pages) = clamp_page(page, total, page_size);

    let items = comment_queries::list_page(
        pool,
        site_id,
        post_slug,
        page_size,
        (page - 1) * page_size,
    )
    .await?;

    Ok(CommentPage {
        items,
        page,
        page_size,
        total,
        total_pages,
    })
}

/// Owner-only; authorization happens upstream. Returns whether a row was
/// actually removed.
pub async fn delete(pool: &PgPool, site_id: i64, id: &str) -> Result<bool> {
    Ok(comment_queries::delete(pool, site_id, id).await?)
}

/// Re-key all comments when a post is renamed. Returns how many moved.
pub async fn move_to_post(
    pool: &PgPool,
    site_id: i64,
    from_slug: &str,
    to_slug: &str,
) -> Result<u64> {
    let from_slug = from_slug.trim();
    let to_slug = to_slug.trim();
    if from_slug.is_empty() || to_slug.is_empty() {
        return Err(EngineError::validation("missing source or target slug"));
    }
    if from_slug == to_slug {
        return Ok(0);
    }
    Ok(comment_queries::move_to_post(pool, site_id, from_slug, to_slug).await?)
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

    fn lazy_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap()
    }

    #[test]
    fn test_create_rejects_empty_fields() {
        rt().block_on(async {
            let pool = lazy_pool();
            let err = create(&pool, 1, "intro", "", None, "hello").await.unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));

            let err = create(&pool, 1, "intro", "alice", None, "   ")
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));

            let err = create(&pool, 1, "", "alice", None, "hello").await.unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        });
    }

    #[test]
    fn test_create_rejects_oversized_fields() {
        rt().block_on(async {
            let pool = lazy_pool();
            let long_name = "x".repeat(MAX_AUTHOR_CHARS + 1);
            let err = create(&pool, 1, "intro", &long_name, None, "hello")
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));

            let long_content = "y".repeat(MAX_CONTENT_CHARS + 1);
            let err = create(&pool, 1, "intro", "alice", None, &long_content)
                .await
                .unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        });
    }

    #[test]
    fn test_move_to_same_slug_is_noop() {
        rt().block_on(async {
            let pool = lazy_pool();
            assert_eq!(move_to_post(&pool, 1, "intro", "intro").await.unwrap(), 0);
            assert!(move_to_post(&pool, 1, "", "intro").await.is_err());
        });
    }
}
