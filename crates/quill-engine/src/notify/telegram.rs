//! Outbound Telegram Bot API relay.
//!
//! A single best-effort sendMessage per event: non-2xx or a network error is
//! a relay failure the pipeline logs and drops. At-most-once, no retries.

use chrono::{DateTime, Utc};
use quill_core::events::{EventKind, NormalizedEvent};
use quill_core::reactions as vocab;
use serde_json::json;

pub async fn send_message(
    client: &reqwest::Client,
    api_base: &str,
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> anyhow::Result<()> {
    let url = format!(
        "{}/bot{}/sendMessage",
        api_base.trim_end_matches('/'),
        bot_token
    );
    let body = json!({
        "chat_id": chat_id,
        "text": text,
        "disable_web_page_preview": true,
    });

    let response = client.post(&url).json(&body).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("telegram relay returned HTTP {}", response.status().as_u16());
    }
    Ok(())
}

/// Deterministic plain-text message: event kind, post title, actor,
/// content/reaction, canonical URL, timestamp.
pub fn format_message(event: &NormalizedEvent, at: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    match event.kind {
        EventKind::Comment => lines.push(format!("New comment on \u{201c}{}\u{201d}", event.post_title)),
        EventKind::Reaction => lines.push(format!("New reaction on \u{201c}{}\u{201d}", event.post_title)),
    }

    let actor = match event.actor_site_slug.as_deref() {
        Some(slug) => format!("{} ({})", event.actor_name, slug),
        None => event.actor_name.clone(),
    };
    lines.push(format!("From: {actor}"));

    if let Some(label) = event.reaction_label.as_deref() {
        let icon = event
            .reaction_key
            .as_deref()
            .and_then(vocab::find)
            .map(|p| p.icon)
            .unwrap_or("");
        lines.push(format!("Reaction: {icon} {label}").trim().to_string());
    }

    if let Some(preview) = event.content_preview.as_deref() {
        lines.push(format!("\u{201c}{preview}\u{201d}"));
    }

    if let Some(url) = event.canonical_url() {
        lines.push(url);
    }

    lines.push(at.format("%Y-%m-%d %H:%M UTC").to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quill_core::events::NotificationEvent;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 30, 0).unwrap()
    }

    fn reaction_event() -> NormalizedEvent {
        NotificationEvent {
            kind: EventKind::Reaction,
            post_slug: "intro".to_string(),
            post_title: "Intro".to_string(),
            actor_name: "a visitor".to_string(),
            actor_site_slug: None,
            content_preview: None,
            reaction_key: Some("fire".to_string()),
            site_origin: Some("https://alice.quill.blog".to_string()),
            target_path: Some("/intro".to_string()),
        }
        .normalize()
        .unwrap()
    }

    #[test]
    fn test_reaction_message_contains_title_and_label() {
        let text = format_message(&reaction_event(), at());
        assert!(text.contains("Intro"));
        assert!(text.contains("Fire"));
        assert!(text.contains("https://alice.quill.blog/intro"));
        assert!(text.contains("2026-08-07 12:30 UTC"));
    }

    #[test]
    fn test_comment_message_contains_preview() {
        let event = NotificationEvent {
            kind: EventKind::Comment,
            post_slug: "intro".to_string(),
            post_title: "Intro".to_string(),
            actor_name: "bob".to_string(),
            actor_site_slug: Some("bob".to_string()),
            content_preview: Some("great read".to_string()),
            reaction_key: None,
            site_origin: None,
            target_path: Some("/intro#comments".to_string()),
        }
        .normalize()
        .unwrap();

        let text = format_message(&event, at());
        assert!(text.starts_with("New comment on"));
        assert!(text.contains("bob (bob)"));
        assert!(text.contains("great read"));
        assert!(text.contains("/intro#comments"));
    }

    #[test]
    fn test_message_is_deterministic() {
        let a = format_message(&reaction_event(), at());
        let b = format_message(&reaction_event(), at());
        assert_eq!(a, b);
    }
}
