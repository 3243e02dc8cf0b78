//! Per-site Telegram relay settings. One row per site, upsert semantics.

use crate::models::TelegramSettings;
use sqlx::PgPool;

pub async fn get(pool: &PgPool, site_id: i64) -> Result<Option<TelegramSettings>, sqlx::Error> {
    sqlx::query_as::<_, TelegramSettings>(
        r#"
        SELECT site_id, enabled, notify_comments, notify_reactions,
               telegram_chat_id, telegram_bot_token_encrypted, updated_at
        FROM site_telegram_settings
        WHERE site_id = $1
        "#,
    )
    .bind(site_id)
    .fetch_optional(pool)
    .await
}

/// Full-row upsert; patch merging happens upstream so the sealed token is
/// written exactly as the engine decided (kept, replaced, or cleared).
pub async fn upsert(
    pool: &PgPool,
    site_id: i64,
    enabled: bool,
    notify_comments: bool,
    notify_reactions: bool,
    telegram_chat_id: Option<&str>,
    telegram_bot_token_encrypted: Option<&str>,
) -> Result<TelegramSettings, sqlx::Error> {
    sqlx::query_as::<_, TelegramSettings>(
        r#"
        INSERT INTO site_telegram_settings
            (site_id, enabled, notify_comments, notify_reactions,
             telegram_chat_id, telegram_bot_token_encrypted)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (site_id) DO UPDATE
        SET enabled = EXCLUDED.enabled,
            notify_comments = EXCLUDED.notify_comments,
            notify_reactions = EXCLUDED.notify_reactions,
            telegram_chat_id = EXCLUDED.telegram_chat_id,
            telegram_bot_token_encrypted = EXCLUDED.telegram_bot_token_encrypted,
            updated_at = now()
        RETURNING site_id, enabled, notify_comments, notify_reactions,
                  telegram_chat_id, telegram_bot_token_encrypted, updated_at
        "#,
    )
    .bind(site_id)
    .bind(enabled)
    .bind(notify_comments)
    .bind(notify_reactions)
    .bind(telegram_chat_id)
    .bind(telegram_bot_token_encrypted)
    .fetch_one(pool)
    .await
}
