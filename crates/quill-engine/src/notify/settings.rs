//! Per-site relay settings with patch/upsert semantics.
//!
//! The bot token crosses this boundary in plaintext exactly twice: inbound
//! on a patch (sealed before it touches the store) and outbound on an
//! explicit `include_secret` read.

use quill_core::secretbox;
use quill_db::models::TelegramSettings;
use quill_db::queries::telegram_settings;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{EngineError, Result};

const MAX_CHAT_ID_CHARS: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub site_id: i64,
    pub enabled: bool,
    pub notify_comments: bool,
    pub notify_reactions: bool,
    pub telegram_chat_id: Option<String>,
    pub has_bot_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,
}

/// Absent fields keep the stored value; an empty string clears the
/// chat id or bot token.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub enabled: Option<bool>,
    pub notify_comments: Option<bool>,
    pub notify_reactions: Option<bool>,
    pub telegram_chat_id: Option<String>,
    pub telegram_bot_token: Option<String>,
}

fn view(settings: TelegramSettings, bot_token: Option<String>) -> SettingsView {
    SettingsView {
        site_id: settings.site_id,
        enabled: settings.enabled,
        notify_comments: settings.notify_comments,
        notify_reactions: settings.notify_reactions,
        telegram_chat_id: settings.telegram_chat_id,
        has_bot_token: settings
            .telegram_bot_token_encrypted
            .as_deref()
            .is_some_and(|s| !s.is_empty()),
        telegram_bot_token: bot_token,
    }
}

fn default_settings(site_id: i64) -> TelegramSettings {
    TelegramSettings {
        site_id,
        enabled: false,
        notify_comments: true,
        notify_reactions: true,
        telegram_chat_id: None,
        telegram_bot_token_encrypted: None,
        updated_at: chrono::Utc::now(),
    }
}

/// Read the settings row, defaulting for sites that never configured the
/// relay. The token is decrypted only on an explicit `include_secret`
/// request; an unreadable token reads as absent rather than erroring.
pub async fn get_settings(
    pool: &PgPool,
    server_secret: &str,
    site_id: i64,
    include_secret: bool,
) -> Result<SettingsView> {
    let settings = telegram_settings::get(pool, site_id)
        .await?
        .unwrap_or_else(|| default_settings(site_id));

    let bot_token = if include_secret {
        settings
            .telegram_bot_token_encrypted
            .as_deref()
            .and_then(|sealed| secretbox::open(server_secret, sealed).ok())
    } else {
        None
    };

    Ok(view(settings, bot_token))
}

pub async fn upsert_settings(
    pool: &PgPool,
    server_secret: &str,
    site_id: i64,
    patch: SettingsPatch,
) -> Result<SettingsView> {
    let current = telegram_settings::get(pool, site_id)
        .await?
        .unwrap_or_else(|| default_settings(site_id));

    let enabled = patch.enabled.unwrap_or(current.enabled);
    let notify_comments = patch.notify_comments.unwrap_or(current.notify_comments);
    let notify_reactions = patch.notify_reactions.unwrap_or(current.notify_reactions);

    let telegram_chat_id = match patch.telegram_chat_id {
        None => current.telegram_chat_id,
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                if trimmed.chars().count() > MAX_CHAT_ID_CHARS {
                    return Err(EngineError::validation("chat id too long"));
                }
                Some(trimmed.to_string())
            }
        }
    };

    let sealed_token = match patch.telegram_bot_token {
        None => current.telegram_bot_token_encrypted,
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(
                    secretbox::seal(server_secret, trimmed)
                        .map_err(|_| EngineError::validation("unable to seal bot token"))?,
                )
            }
        }
    };

    let stored = telegram_settings::upsert(
        pool,
        site_id,
        enabled,
        notify_comments,
        notify_reactions,
        telegram_chat_id.as_deref(),
        sealed_token.as_deref(),
    )
    .await?;

    Ok(view(stored, None))
}
