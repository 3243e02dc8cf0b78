//! Notification pipeline.
//!
//! Triggering writes enqueue events here and move on. Persisting the in-app
//! notification, pruning the feed, decrypting the bot token and the outbound
//! relay call all happen in a detached task whose failures are logged and
//! contained. A failed Telegram send must never fail a comment post.

pub mod settings;
pub mod telegram;

use chrono::Utc;
use nanoid::nanoid;
use quill_core::events::{EventKind, NotificationEvent};
use quill_core::secretbox;
use quill_db::models::{SiteNotification, TelegramSettings};
use quill_db::queries::{notifications, telegram_settings};
use rand::Rng;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::error::Result;
use crate::pagination::{clamp_page, clamp_page_size};

/// The in-app feed is pruned to roughly this many rows per site.
pub const RETENTION_KEEP: i64 = 800;

const PRUNE_PROBABILITY: f64 = 0.02;

#[derive(Clone)]
pub struct Notifier {
    db: PgPool,
    http: reqwest::Client,
    server_secret: String,
    telegram_api_base: String,
}

impl Notifier {
    pub fn new(
        db: PgPool,
        http: reqwest::Client,
        server_secret: String,
        telegram_api_base: String,
    ) -> Self {
        Self {
            db,
            http,
            server_secret,
            telegram_api_base,
        }
    }

    /// Fire-and-forget: schedules the pipeline and returns immediately. The
    /// caller's HTTP response never waits on the relay.
    pub fn enqueue(&self, site_id: i64, event: NotificationEvent) {
        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(err) = notifier.process(site_id, event).await {
                warn!(site_id, error = %err, "notification pipeline failed");
            }
        });
    }

    async fn process(&self, site_id: i64, event: NotificationEvent) -> anyhow::Result<()> {
        let event = event.normalize()?;

        let id = format!("ntf_{}", nanoid!(12));
        notifications::insert(
            &self.db,
            &id,
            site_id,
            event.kind.as_str(),
            &event.post_slug,
            &event.post_title,
            &event.actor_name,
            event.actor_site_slug.as_deref(),
            event.content_preview.as_deref(),
            event.reaction_key.as_deref(),
            event.reaction_label.as_deref(),
            event.target_path.as_deref(),
        )
        .await?;

        // Retention sweep is advisory; its failure must not stop the relay.
        if rand::thread_rng().gen::<f64>() < PRUNE_PROBABILITY {
            match notifications::prune_to_recent(&self.db, site_id, RETENTION_KEEP).await {
                Ok(0) => {}
                Ok(pruned) => debug!(site_id, pruned, "pruned notification feed"),
                Err(err) => warn!(site_id, error = %err, "notification prune failed"),
            }
        }

        let Some(site_settings) = telegram_settings::get(&self.db, site_id).await? else {
            return Ok(());
        };
        if !relay_enabled(&site_settings, event.kind) {
            return Ok(());
        }
        let Some((chat_id, sealed_token)) = relay_credentials(&site_settings) else {
            return Ok(());
        };

        let bot_token = match secretbox::open(&self.server_secret, sealed_token) {
            Ok(token) => token,
            Err(err) => {
                // Unreadable token behaves exactly like no token at all.
                debug!(site_id, error = %err, "bot token unreadable, relay skipped");
                return Ok(());
            }
        };

        let text = telegram::format_message(&event, Utc::now());
        telegram::send_message(
            &self.http,
            &self.telegram_api_base,
            &bot_token,
            chat_id,
            &text,
        )
        .await?;

        Ok(())
    }
}

/// Per-site gate: the master switch plus the per-event-type toggle.
pub fn relay_enabled(settings: &TelegramSettings, kind: EventKind) -> bool {
    if !settings.enabled {
        return false;
    }
    match kind {
        EventKind::Comment => settings.notify_comments,
        EventKind::Reaction => settings.notify_reactions,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub items: Vec<SiteNotification>,
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
    pub unread: i64,
}

/// Which notifications to mark read.
#[derive(Debug, Clone)]
pub enum ReadSelector {
    All,
    Ids(Vec<String>),
}

pub async fn list_notifications(
    pool: &PgPool,
    site_id: i64,
    page: i64,
    page_size: i64,
) -> Result<NotificationPage> {
    let page_size = clamp_page_size(page_size);
    let total = notifications::count(pool, site_id).await?;
    let unread = notifications::unread_count(pool, site_id).await?;
    let (page, total_pages) = clamp_page(page, total, page_size);

    let items =
        notifications::list_page(pool, site_id, page_size, (page - 1) * page_size).await?;

    Ok(NotificationPage {
        items,
        page,
        page_size,
        total,
        total_pages,
        unread,
    })
}

/// Idempotent: already-read rows are untouched, so the returned count is the
/// number of notifications that actually transitioned.
pub async fn mark_notifications_read(
    pool: &PgPool,
    site_id: i64,
    selector: ReadSelector,
) -> Result<u64> {
    let updated = match selector {
        ReadSelector::All => notifications::mark_all_read(pool, site_id).await?,
        ReadSelector::Ids(ids) if ids.is_empty() => 0,
        ReadSelector::Ids(ids) => notifications::mark_read(pool, site_id, &ids).await?,
    };
    Ok(updated)
}

/// Both chat id and sealed token must be present and non-blank.
fn relay_credentials(settings: &TelegramSettings) -> Option<(&str, &str)> {
    let chat_id = settings
        .telegram_chat_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    let sealed = settings
        .telegram_bot_token_encrypted
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())?;
    Some((chat_id, sealed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(
        enabled: bool,
        notify_comments: bool,
        notify_reactions: bool,
        chat_id: Option<&str>,
        sealed: Option<&str>,
    ) -> TelegramSettings {
        TelegramSettings {
            site_id: 42,
            enabled,
            notify_comments,
            notify_reactions,
            telegram_chat_id: chat_id.map(String::from),
            telegram_bot_token_encrypted: sealed.map(String::from),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_relay_disabled_master_switch() {
        let s = settings(false, true, true, Some("123"), Some("v1:a:b"));
        assert!(!relay_enabled(&s, EventKind::Comment));
        assert!(!relay_enabled(&s, EventKind::Reaction));
    }

    #[test]
    fn test_relay_per_event_type_toggles() {
        let s = settings(true, false, true, Some("123"), Some("v1:a:b"));
        assert!(!relay_enabled(&s, EventKind::Comment));
        assert!(relay_enabled(&s, EventKind::Reaction));

        let s = settings(true, true, false, Some("123"), Some("v1:a:b"));
        assert!(relay_enabled(&s, EventKind::Comment));
        assert!(!relay_enabled(&s, EventKind::Reaction));
    }

    #[test]
    fn test_relay_requires_both_credentials() {
        let s = settings(true, true, true, Some("123"), None);
        assert!(relay_credentials(&s).is_none());

        let s = settings(true, true, true, None, Some("v1:a:b"));
        assert!(relay_credentials(&s).is_none());

        let s = settings(true, true, true, Some("  "), Some("v1:a:b"));
        assert!(relay_credentials(&s).is_none());

        let s = settings(true, true, true, Some("123"), Some("v1:a:b"));
        assert_eq!(relay_credentials(&s), Some(("123", "v1:a:b")));
    }
}
