//! Notification events emitted by the comment store and reaction engine.
//!
//! Events are normalized before anything touches the store: all free-text
//! fields are length-capped, target paths are restricted to same-origin
//! relative paths, and reaction keys must belong to the preset vocabulary.

use serde::{Deserialize, Serialize};

use crate::reactions;

pub const MAX_NAME_CHARS: usize = 60;
pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_PREVIEW_CHARS: usize = 320;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Comment,
    Reaction,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Comment => "comment",
            EventKind::Reaction => "reaction",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "comment" => Some(EventKind::Comment),
            "reaction" => Some(EventKind::Reaction),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub kind: EventKind,
    pub post_slug: String,
    pub post_title: String,
    pub actor_name: String,
    pub actor_site_slug: Option<String>,
    pub content_preview: Option<String>,
    pub reaction_key: Option<String>,
    /// Public origin of the tenant site (e.g. `https://alice.quill.blog`),
    /// supplied by the request layer for canonical-URL formatting.
    pub site_origin: Option<String>,
    pub target_path: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("reaction event is missing a reaction key")]
    MissingReactionKey,
    #[error("unknown reaction key: {0}")]
    UnknownReactionKey(String),
}

/// Char-boundary-safe truncation; byte-index slicing would panic on emoji.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Only same-origin relative paths survive. `//host/...` is scheme-relative
/// and would escape the origin, so it is dropped along with anything not
/// starting with `/`.
pub fn sanitize_target_path(path: &str) -> Option<String> {
    let path = path.trim();
    if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') {
        Some(truncate_chars(path, 512))
    } else {
        None
    }
}

/// An origin must be a bare http(s) host, no trailing slash or path.
pub fn sanitize_origin(origin: &str) -> Option<String> {
    let origin = origin.trim().trim_end_matches('/');
    let rest = origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))?;
    if rest.is_empty() || rest.contains('/') || rest.contains(char::is_whitespace) {
        return None;
    }
    Some(truncate_chars(origin, 200))
}

impl NotificationEvent {
    /// Normalize in place, consuming the raw event. Returns the reaction
    /// label alongside so callers never re-derive it from the key.
    pub fn normalize(self) -> Result<NormalizedEvent, EventError> {
        let reaction = match self.kind {
            EventKind::Reaction => {
                let key = self
                    .reaction_key
                    .as_deref()
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .ok_or(EventError::MissingReactionKey)?;
                let preset = reactions::find(key)
                    .ok_or_else(|| EventError::UnknownReactionKey(key.to_string()))?;
                Some(preset)
            }
            EventKind::Comment => None,
        };

        Ok(NormalizedEvent {
            kind: self.kind,
            post_slug: truncate_chars(self.post_slug.trim(), MAX_TITLE_CHARS),
            post_title: truncate_chars(self.post_title.trim(), MAX_TITLE_CHARS),
            actor_name: truncate_chars(self.actor_name.trim(), MAX_NAME_CHARS),
            actor_site_slug: self
                .actor_site_slug
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| truncate_chars(s, MAX_NAME_CHARS)),
            content_preview: self
                .content_preview
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| truncate_chars(s, MAX_PREVIEW_CHARS)),
            reaction_key: reaction.map(|p| p.key.to_string()),
            reaction_label: reaction.map(|p| p.label.to_string()),
            site_origin: self.site_origin.as_deref().and_then(sanitize_origin),
            target_path: self
                .target_path
                .as_deref()
                .and_then(sanitize_target_path),
        })
    }
}

/// An event that passed normalization and is safe to persist and relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub post_slug: String,
    pub post_title: String,
    pub actor_name: String,
    pub actor_site_slug: Option<String>,
    pub content_preview: Option<String>,
    pub reaction_key: Option<String>,
    pub reaction_label: Option<String>,
    pub site_origin: Option<String>,
    pub target_path: Option<String>,
}

impl NormalizedEvent {
    /// Canonical URL for the relay message: origin + path when both are
    /// known, the bare path otherwise.
    pub fn canonical_url(&self) -> Option<String> {
        match (&self.site_origin, &self.target_path) {
            (Some(origin), Some(path)) => Some(format!("{origin}{path}")),
            (None, Some(path)) => Some(path.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment_event() -> NotificationEvent {
        NotificationEvent {
            kind: EventKind::Comment,
            post_slug: "hello-world".to_string(),
            post_title: "Hello World".to_string(),
            actor_name: "alice".to_string(),
            actor_site_slug: Some("alice".to_string()),
            content_preview: Some("nice post!".to_string()),
            reaction_key: None,
            site_origin: Some("https://alice.quill.blog".to_string()),
            target_path: Some("/hello-world#comments".to_string()),
        }
    }

    #[test]
    fn test_event_kind_round_trips() {
        assert_eq!(EventKind::parse("comment"), Some(EventKind::Comment));
        assert_eq!(EventKind::parse("reaction"), Some(EventKind::Reaction));
        assert_eq!(EventKind::parse("like"), None);
        assert_eq!(EventKind::Comment.as_str(), "comment");
        assert_eq!(EventKind::Reaction.as_str(), "reaction");
    }

    #[test]
    fn test_comment_event_passes_through() {
        let normalized = comment_event().normalize().unwrap();
        assert_eq!(normalized.kind, EventKind::Comment);
        assert_eq!(normalized.actor_name, "alice");
        assert_eq!(normalized.content_preview.as_deref(), Some("nice post!"));
        assert_eq!(
            normalized.target_path.as_deref(),
            Some("/hello-world#comments")
        );
        assert!(normalized.reaction_key.is_none());
        assert!(normalized.reaction_label.is_none());
    }

    #[test]
    fn test_reaction_event_resolves_label() {
        let mut event = comment_event();
        event.kind = EventKind::Reaction;
        event.reaction_key = Some("fire".to_string());

        let normalized = event.normalize().unwrap();
        assert_eq!(normalized.reaction_key.as_deref(), Some("fire"));
        assert_eq!(normalized.reaction_label.as_deref(), Some("Fire"));
    }

    #[test]
    fn test_reaction_event_rejects_unknown_key() {
        let mut event = comment_event();
        event.kind = EventKind::Reaction;
        event.reaction_key = Some("unicorn".to_string());

        assert_eq!(
            event.normalize().unwrap_err(),
            EventError::UnknownReactionKey("unicorn".to_string())
        );
    }

    #[test]
    fn test_reaction_event_requires_key() {
        let mut event = comment_event();
        event.kind = EventKind::Reaction;
        event.reaction_key = None;

        assert_eq!(event.normalize().unwrap_err(), EventError::MissingReactionKey);
    }

    #[test]
    fn test_comment_event_drops_stray_reaction_key() {
        let mut event = comment_event();
        event.reaction_key = Some("fire".to_string());

        let normalized = event.normalize().unwrap();
        assert!(normalized.reaction_key.is_none());
    }

    #[test]
    fn test_oversized_fields_truncated() {
        let mut event = comment_event();
        event.actor_name = "x".repeat(500);
        event.content_preview = Some("y".repeat(5000));

        let normalized = event.normalize().unwrap();
        assert_eq!(normalized.actor_name.chars().count(), MAX_NAME_CHARS);
        assert_eq!(
            normalized.content_preview.unwrap().chars().count(),
            MAX_PREVIEW_CHARS
        );
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        let s = "\u{1f525}\u{1f525}\u{1f525}";
        assert_eq!(truncate_chars(s, 2), "\u{1f525}\u{1f525}");
    }

    #[test]
    fn test_target_path_must_be_same_origin() {
        assert_eq!(
            sanitize_target_path("/intro"),
            Some("/intro".to_string())
        );
        assert_eq!(sanitize_target_path("//evil.example/x"), None);
        assert_eq!(sanitize_target_path("https://evil.example/x"), None);
        assert_eq!(sanitize_target_path("relative/path"), None);
        assert_eq!(sanitize_target_path(""), None);
    }

    #[test]
    fn test_origin_sanitized() {
        assert_eq!(
            sanitize_origin("https://alice.quill.blog/"),
            Some("https://alice.quill.blog".to_string())
        );
        assert_eq!(sanitize_origin("ftp://alice.quill.blog"), None);
        assert_eq!(sanitize_origin("https://a.example/path"), None);
        assert_eq!(sanitize_origin("https://"), None);
    }

    #[test]
    fn test_canonical_url_composition() {
        let normalized = comment_event().normalize().unwrap();
        assert_eq!(
            normalized.canonical_url().as_deref(),
            Some("https://alice.quill.blog/hello-world#comments")
        );

        let mut event = comment_event();
        event.site_origin = None;
        let normalized = event.normalize().unwrap();
        assert_eq!(
            normalized.canonical_url().as_deref(),
            Some("/hello-world#comments")
        );
    }

    #[test]
    fn test_empty_optional_fields_become_none() {
        let mut event = comment_event();
        event.actor_site_slug = Some("   ".to_string());
        event.content_preview = Some(String::new());

        let normalized = event.normalize().unwrap();
        assert!(normalized.actor_site_slug.is_none());
        assert!(normalized.content_preview.is_none());
    }
}
