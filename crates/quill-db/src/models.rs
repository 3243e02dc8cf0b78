use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RateLimitWindow {
    pub rate_key: String,
    pub window_start_ms: i64,
    pub attempts: i32,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate row for the per-post reaction leaderboard.
#[derive(Debug, Clone, FromRow)]
pub struct ReactionCount {
    pub reaction_key: String,
    pub count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct PageViewCount {
    pub resource_key: String,
    pub view_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub site_id: i64,
    pub post_slug: String,
    pub author_name: String,
    pub author_site_slug: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// `read_at` is null while the notification is unread; marking read is
/// terminal and idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SiteNotification {
    pub id: String,
    pub site_id: i64,
    pub event_type: String,
    pub post_slug: String,
    pub post_title: String,
    pub actor_name: String,
    pub actor_site_slug: Option<String>,
    pub content_preview: Option<String>,
    pub reaction_key: Option<String>,
    pub reaction_label: Option<String>,
    pub target_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// One row per site, upsert semantics. The bot token only ever appears here
/// in sealed form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TelegramSettings {
    pub site_id: i64,
    pub enabled: bool,
    pub notify_comments: bool,
    pub notify_reactions: bool,
    pub telegram_chat_id: Option<String>,
    pub telegram_bot_token_encrypted: Option<String>,
    pub updated_at: DateTime<Utc>,
}
