//! Idempotent schema bootstrap.
//!
//! Every table is created lazily on first use and namespaced by `site_id`.
//! `ensure_schema` is invoked once at process startup; the once-guard makes
//! any later call a cheap no-op, so callers on hot paths never pay for it.

use sqlx::PgPool;
use tokio::sync::OnceCell;

static SCHEMA_READY: OnceCell<()> = OnceCell::const_new();

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS rate_limit_windows (
    rate_key        VARCHAR(180) PRIMARY KEY,
    window_start_ms BIGINT NOT NULL,
    attempts        INTEGER NOT NULL CHECK (attempts >= 1),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS reactions (
    id           TEXT PRIMARY KEY,
    site_id      BIGINT NOT NULL,
    post_slug    TEXT NOT NULL,
    reaction_key TEXT NOT NULL,
    actor_token  TEXT NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_reactions_unique
    ON reactions (site_id, post_slug, reaction_key, actor_token);

CREATE INDEX IF NOT EXISTS idx_reactions_post
    ON reactions (site_id, post_slug);

CREATE TABLE IF NOT EXISTS page_views (
    site_id       BIGINT NOT NULL,
    resource_type TEXT NOT NULL,
    resource_key  TEXT NOT NULL,
    view_count    BIGINT NOT NULL DEFAULT 0 CHECK (view_count >= 0),
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (site_id, resource_type, resource_key)
);

CREATE TABLE IF NOT EXISTS comments (
    id               TEXT PRIMARY KEY,
    site_id          BIGINT NOT NULL,
    post_slug        TEXT NOT NULL,
    author_name      TEXT NOT NULL,
    author_site_slug TEXT,
    content          TEXT NOT NULL,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_comments_post
    ON comments (site_id, post_slug, created_at DESC);

CREATE TABLE IF NOT EXISTS site_notifications (
    id              TEXT PRIMARY KEY,
    site_id         BIGINT NOT NULL,
    event_type      TEXT NOT NULL CHECK (event_type IN ('comment', 'reaction')),
    post_slug       TEXT NOT NULL,
    post_title      TEXT NOT NULL,
    actor_name      TEXT NOT NULL,
    actor_site_slug TEXT,
    content_preview TEXT,
    reaction_key    TEXT,
    reaction_label  TEXT,
    target_path     TEXT,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    read_at         TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_site_notifications_feed
    ON site_notifications (site_id, created_at DESC);

CREATE TABLE IF NOT EXISTS site_telegram_settings (
    site_id                      BIGINT PRIMARY KEY,
    enabled                      BOOLEAN NOT NULL DEFAULT FALSE,
    notify_comments              BOOLEAN NOT NULL DEFAULT TRUE,
    notify_reactions             BOOLEAN NOT NULL DEFAULT TRUE,
    telegram_chat_id             TEXT,
    telegram_bot_token_encrypted TEXT,
    updated_at                   TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    SCHEMA_READY
        .get_or_try_init(|| async {
            sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
            Ok::<(), sqlx::Error>(())
        })
        .await?;
    Ok(())
}
