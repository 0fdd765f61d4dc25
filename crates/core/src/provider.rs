//! The closed set of external image-generation providers.
//!
//! Providers are modelled as an explicit enum rather than runtime type
//! inspection so that selection, cost lookup, and availability tracking
//! all dispatch over the same tagged set.

use serde::{Deserialize, Serialize};

/// An external image-generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI GPT Image 1 — highest fidelity, most expensive.
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini 2.5 Flash Image — cheapest and fastest.
    Gemini,
}

/// Fixed priority order used for deterministic fallback selection.
///
/// When the tier-preferred provider is unavailable, candidates are tried
/// in this order. Never randomized, so behavior is reproducible.
pub const FALLBACK_ORDER: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

impl ProviderKind {
    /// All known providers, in fallback priority order.
    pub fn all() -> &'static [ProviderKind] {
        &FALLBACK_ORDER
    }

    /// Stable string form used in content keys, metrics labels, and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// The upstream model identifier sent on the wire.
    pub fn model_id(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-image-1",
            ProviderKind::Gemini => "gemini-2.5-flash-image-preview",
        }
    }

    /// Dense index into per-provider state arrays.
    pub fn index(&self) -> usize {
        match self {
            ProviderKind::OpenAi => 0,
            ProviderKind::Gemini => 1,
        }
    }

    /// Number of known providers (size for per-provider state arrays).
    pub const COUNT: usize = 2;
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_is_stable() {
        assert_eq!(ProviderKind::OpenAi.as_str(), "openai");
        assert_eq!(ProviderKind::Gemini.as_str(), "gemini");
    }

    #[test]
    fn model_ids_match_upstream_names() {
        assert_eq!(ProviderKind::OpenAi.model_id(), "gpt-image-1");
        assert_eq!(
            ProviderKind::Gemini.model_id(),
            "gemini-2.5-flash-image-preview"
        );
    }

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; ProviderKind::COUNT];
        for p in ProviderKind::all() {
            assert!(!seen[p.index()]);
            seen[p.index()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn fallback_order_prefers_openai() {
        assert_eq!(FALLBACK_ORDER[0], ProviderKind::OpenAi);
    }
}
