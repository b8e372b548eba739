//! Avatar generation collaborator
//!
//! Builds image URLs from external avatar providers. Only the result
//! contract matters to the face: a URL (with a reliable fallback) or a
//! failure. The chosen avatar and a bounded history are persisted through
//! the key-value store.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;
use crate::store::{KvStore, KvStoreExt};

/// Store key for the user-chosen avatar URL
pub const CUSTOM_AVATAR_KEY: &str = "custom-avatar-url";

/// Store key for previously generated avatars
pub const AVATAR_HISTORY_KEY: &str = "avatar-history";

/// Bounded history length
pub const MAX_AVATAR_HISTORY: usize = 10;

const DICEBEAR_BASE: &str = "https://api.dicebear.com/7.x";
const ROBOHASH_BASE: &str = "https://robohash.org";
const POLLINATIONS_BASE: &str = "https://image.pollinations.ai/prompt";

/// Image providers, from reliable to experimental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarProvider {
    /// Deterministic SVG shapes; always resolves
    #[default]
    DiceBear,
    /// Robot PNGs keyed by seed
    Robohash,
    /// AI-generated images; may fail, always paired with a fallback
    Pollinations,
}

/// DiceBear style families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvatarStyle {
    #[default]
    Shapes,
    Identicon,
    Bottts,
    Avataaars,
}

impl AvatarStyle {
    fn as_path(self) -> &'static str {
        match self {
            Self::Shapes => "shapes",
            Self::Identicon => "identicon",
            Self::Bottts => "bottts",
            Self::Avataaars => "avataaars",
        }
    }
}

/// The contract consumed by the face: a URL or a failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarResult {
    pub success: bool,
    pub url: Option<String>,
    /// Reliable provider URL to fall back on when `url` fails to load
    pub fallback_url: Option<String>,
    pub seed: String,
    pub source: AvatarProvider,
    pub error: Option<String>,
}

/// One persisted history entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarHistoryEntry {
    pub url: String,
    pub seed: String,
    pub source: AvatarProvider,
    pub created_at_ms: i64,
}

fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// DiceBear SVG URL for a seed and style
pub fn dicebear_url(seed: &str, style: AvatarStyle) -> String {
    format!(
        "{DICEBEAR_BASE}/{}/svg?seed={}&backgroundColor=1e3a5f,0f172a,1e40af&size=512",
        style.as_path(),
        percent_encode(seed)
    )
}

/// Robohash PNG URL for a seed
pub fn robohash_url(seed: &str) -> String {
    format!("{ROBOHASH_BASE}/{}.png?size=512x512&set=set4", percent_encode(seed))
}

/// Pollinations AI-image URL for a prompt and seed
pub fn pollinations_url(prompt: &str, seed: &str) -> String {
    format!("{POLLINATIONS_BASE}/{}?seed={}", percent_encode(prompt), percent_encode(seed))
}

/// Avatar generator with persisted history
pub struct AvatarGenerator {
    store: Arc<dyn KvStore>,
}

impl AvatarGenerator {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Build an avatar URL. DiceBear is always attached as the fallback so
    /// a failing experimental provider never leaves the face blank.
    pub fn generate(
        &self,
        prompt: &str,
        provider: AvatarProvider,
        style: AvatarStyle,
        seed: Option<String>,
        now_ms: i64,
    ) -> AvatarResult {
        let seed = seed.unwrap_or_else(random_seed);
        let url = match provider {
            AvatarProvider::DiceBear => dicebear_url(&seed, style),
            AvatarProvider::Robohash => robohash_url(&seed),
            AvatarProvider::Pollinations => pollinations_url(prompt, &seed),
        };

        let result = AvatarResult {
            success: true,
            url: Some(url.clone()),
            fallback_url: Some(dicebear_url(&seed, style)),
            seed: seed.clone(),
            source: provider,
            error: None,
        };

        if let Err(e) = self.push_history(AvatarHistoryEntry {
            url,
            seed,
            source: provider,
            created_at_ms: now_ms,
        }) {
            warn!("Failed to record avatar history: {}", e);
        }
        result
    }

    /// The user-chosen avatar URL, if any
    pub fn custom_avatar(&self) -> Option<String> {
        self.store.get_json(CUSTOM_AVATAR_KEY).ok().flatten()
    }

    pub fn set_custom_avatar(&self, url: &str) -> Result<()> {
        self.store.set_json(CUSTOM_AVATAR_KEY, &url)
    }

    pub fn clear_custom_avatar(&self) -> Result<()> {
        self.store.remove(CUSTOM_AVATAR_KEY)
    }

    /// Newest-first generation history
    pub fn history(&self) -> Vec<AvatarHistoryEntry> {
        self.store
            .get_json(AVATAR_HISTORY_KEY)
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    fn push_history(&self, entry: AvatarHistoryEntry) -> Result<()> {
        let mut history = self.history();
        history.insert(0, entry);
        history.truncate(MAX_AVATAR_HISTORY);
        self.store.set_json(AVATAR_HISTORY_KEY, &history)
    }
}

fn random_seed() -> String {
    rand::rng().random_range(0..1_000_000u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn generator() -> AvatarGenerator {
        AvatarGenerator::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_dicebear_url_shape() {
        let url = dicebear_url("my seed", AvatarStyle::Bottts);
        assert!(url.starts_with("https://api.dicebear.com/7.x/bottts/svg?seed=my%20seed"));
        assert!(url.contains("size=512"));
    }

    #[test]
    fn test_pollinations_carries_fallback() {
        let result = generator().generate(
            "geometric face",
            AvatarProvider::Pollinations,
            AvatarStyle::Shapes,
            Some("42".to_string()),
            0,
        );
        assert!(result.success);
        assert!(result.url.unwrap().contains("pollinations"));
        assert!(result.fallback_url.unwrap().contains("dicebear"));
        assert_eq!(result.seed, "42");
    }

    #[test]
    fn test_history_bounded_newest_first() {
        let generator = generator();
        for i in 0..15 {
            generator.generate(
                "p",
                AvatarProvider::DiceBear,
                AvatarStyle::Shapes,
                Some(format!("s{i}")),
                i,
            );
        }
        let history = generator.history();
        assert_eq!(history.len(), MAX_AVATAR_HISTORY);
        assert_eq!(history[0].seed, "s14");
    }

    #[test]
    fn test_custom_avatar_roundtrip() {
        let generator = generator();
        assert!(generator.custom_avatar().is_none());
        generator.set_custom_avatar("https://example/me.png").unwrap();
        assert_eq!(
            generator.custom_avatar().as_deref(),
            Some("https://example/me.png")
        );
        generator.clear_custom_avatar().unwrap();
        assert!(generator.custom_avatar().is_none());
    }
}
