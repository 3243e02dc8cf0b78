//! Comment database operations.
//!
//! Comments are append-only per post; the owner can delete individual rows,
//! and a post rename re-keys all of them in one statement.

use crate::models::Comment;
use sqlx::PgPool;

pub async fn insert(
    pool: &PgPool,
    id: &str,
    site_id: i64,
    post_slug: &str,
    author_name: &str,
    author_site_slug: Option<&str>,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (id, site_id, post_slug, author_name, author_site_slug, content)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, site_id, post_slug, author_name, author_site_slug, content, created_at
        "#,
    )
    .bind(id)
    .bind(site_id)
    .bind(post_slug)
    .bind(author_name)
    .bind(author_site_slug)
    .bind(content)
    .fetch_one(pool)
    .await
}

/// One page of comments, newest first.
pub async fn list_page(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, site_id, post_slug, author_name, author_site_slug, content, created_at
        FROM comments
        WHERE site_id = $1 AND post_slug = $2
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(site_id)
    .bind(post_slug)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_for_post(
    pool: &PgPool,
    site_id: i64,
    post_slug: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM comments
        WHERE site_id = $1 AND post_slug = $2
        "#,
    )
    .bind(site_id)
    .bind(post_slug)
    .fetch_one(pool)
    .await
}

/// Returns whether a row was actually removed. The site_id guard keeps one
/// tenant from deleting another tenant's comment by id.
pub async fn delete(pool: &PgPool, site_id: i64, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM comments
        WHERE site_id = $1 AND id = $2
        "#,
    )
    .bind(site_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Bulk re-key after a post rename. A single UPDATE, so no comment is ever
/// observable under neither slug.
pub async fn move_to_post(
    pool: &PgPool,
    site_id: i64,
    from_slug: &str,
    to_slug: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET post_slug = $3
        WHERE site_id = $1 AND post_slug = $2
        "#,
    )
    .bind(site_id)
    .bind(from_slug)
    .bind(to_slug)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
