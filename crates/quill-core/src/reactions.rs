//! The preset reaction vocabulary.
//!
//! Declaration order is significant: snapshot items tie-break on it, so the
//! order below is the canonical "leaderboard" order for equal counts.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReactionPreset {
    pub key: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

pub const PRESETS: [ReactionPreset; 14] = [
    ReactionPreset { key: "heart", icon: "\u{2764}\u{fe0f}", label: "Love" },
    ReactionPreset { key: "like", icon: "\u{1f44d}", label: "Like" },
    ReactionPreset { key: "fire", icon: "\u{1f525}", label: "Fire" },
    ReactionPreset { key: "rocket", icon: "\u{1f680}", label: "Rocket" },
    ReactionPreset { key: "clap", icon: "\u{1f44f}", label: "Applause" },
    ReactionPreset { key: "party", icon: "\u{1f389}", label: "Party" },
    ReactionPreset { key: "laugh", icon: "\u{1f602}", label: "Funny" },
    ReactionPreset { key: "surprise", icon: "\u{1f62e}", label: "Wow" },
    ReactionPreset { key: "thinking", icon: "\u{1f914}", label: "Thinking" },
    ReactionPreset { key: "eyes", icon: "\u{1f440}", label: "Eyes" },
    ReactionPreset { key: "star", icon: "\u{2b50}", label: "Star" },
    ReactionPreset { key: "lion", icon: "\u{1f981}", label: "Lion" },
    ReactionPreset { key: "dragon", icon: "\u{1f409}", label: "Dragon" },
    ReactionPreset { key: "gem", icon: "\u{1f48e}", label: "Gem" },
];

pub fn find(key: &str) -> Option<&'static ReactionPreset> {
    PRESETS.iter().find(|p| p.key == key)
}

pub fn is_valid_key(key: &str) -> bool {
    find(key).is_some()
}

/// Declaration-order index, used as the deterministic tie-break when sorting
/// snapshot items by count.
pub fn position(key: &str) -> Option<usize> {
    PRESETS.iter().position(|p| p.key == key)
}
