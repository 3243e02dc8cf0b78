//! Rate-limit window rows. One row per key, overwritten in place.

use crate::models::RateLimitWindow;
use sqlx::PgPool;

pub async fn get(pool: &PgPool, rate_key: &str) -> Result<Option<RateLimitWindow>, sqlx::Error> {
    sqlx::query_as::<_, RateLimitWindow>(
        r#"
        SELECT rate_key, window_start_ms, attempts, updated_at
        FROM rate_limit_windows
        WHERE rate_key = $1
        "#,
    )
    .bind(rate_key)
    .fetch_optional(pool)
    .await
}

/// Open a fresh window for the key, resetting the attempt counter to 1.
/// Upsert, so it also serves as the reset after an expired window.
pub async fn start_window(
    pool: &PgPool,
    rate_key: &str,
    window_start_ms: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO rate_limit_windows (rate_key, window_start_ms, attempts)
        VALUES ($1, $2, 1)
        ON CONFLICT (rate_key) DO UPDATE
        SET window_start_ms = EXCLUDED.window_start_ms,
            attempts = 1,
            updated_at = now()
        "#,
    )
    .bind(rate_key)
    .bind(window_start_ms)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically bump the attempt counter inside an open window.
///
/// Returns the post-increment count, or None if the row vanished between the
/// caller's read and this write (treated as a fresh window upstream).
pub async fn increment(pool: &PgPool, rate_key: &str) -> Result<Option<i32>, sqlx::Error> {
    let attempts: Option<i32> = sqlx::query_scalar(
        r#"
        UPDATE rate_limit_windows
        SET attempts = attempts + 1, updated_at = now()
        WHERE rate_key = $1
        RETURNING attempts
        "#,
    )
    .bind(rate_key)
    .fetch_optional(pool)
    .await?;
    Ok(attempts)
}

/// Drop a window outright, e.g. after a successful login.
pub async fn clear(pool: &PgPool, rate_key: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM rate_limit_windows
        WHERE rate_key = $1
        "#,
    )
    .bind(rate_key)
    .execute(pool)
    .await?;
    Ok(())
}

/// Delete rows idle for more than 24 hours. Idempotent and commutative, safe
/// to run concurrently from many handlers.
pub async fn delete_stale(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM rate_limit_windows
        WHERE updated_at < now() - INTERVAL '24 hours'
        "#,
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
