//! Generation request value type and its content-addressed key.
//!
//! A [`GenerationRequest`] is immutable once built. Its [`content_key`]
//! is a SHA-256 digest over every field that affects the produced image,
//! serialized in a fixed canonical order so that semantically identical
//! requests always collide in the cache regardless of how they were
//! constructed.
//!
//! [`content_key`]: GenerationRequest::content_key

use serde::{Deserialize, Serialize};

use crate::hashing::sha256_hex;
use crate::provider::ProviderKind;

// ---------------------------------------------------------------------------
// Concept
// ---------------------------------------------------------------------------

/// A design concept variant for the card artwork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Concept {
    /// Medical authority focus, symmetric layout, clinical trust.
    ClinicalPrecision,
    /// Dynamic energy, performance-focused design elements.
    AthleticEdge,
    /// Equinox-level luxury, spa-like sophistication.
    LuxuryWellness,
    /// Caller-supplied concept name with no predefined styling.
    Custom(String),
}

impl Concept {
    /// Stable string form used in content keys and metrics labels.
    pub fn as_str(&self) -> &str {
        match self {
            Concept::ClinicalPrecision => "clinical-precision",
            Concept::AthleticEdge => "athletic-edge",
            Concept::LuxuryWellness => "luxury-wellness",
            Concept::Custom(name) => name.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// CardSide
// ---------------------------------------------------------------------------

/// Which side of the card to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardSide {
    Front,
    Back,
}

impl CardSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardSide::Front => "front",
            CardSide::Back => "back",
        }
    }
}

// ---------------------------------------------------------------------------
// QualityTier
// ---------------------------------------------------------------------------

/// Named service level controlling provider preference and unit cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Rapid iteration and concept exploration.
    Draft,
    /// Intermediate review output.
    Review,
    /// Final print-ready deliverable.
    Production,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Draft => "draft",
            QualityTier::Review => "review",
            QualityTier::Production => "production",
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationRequest
// ---------------------------------------------------------------------------

/// An immutable request for one generated card image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub concept: Concept,
    pub side: CardSide,
    pub quality_tier: QualityTier,
    /// Pin the request to a specific provider instead of tier-based selection.
    pub explicit_provider: Option<ProviderKind>,
    /// Replace the assembled brand prompt entirely.
    pub prompt_override: Option<String>,
}

impl GenerationRequest {
    /// Create a request with no explicit provider and no prompt override.
    pub fn new(concept: Concept, side: CardSide, quality_tier: QualityTier) -> Self {
        Self {
            concept,
            side,
            quality_tier,
            explicit_provider: None,
            prompt_override: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.explicit_provider = Some(provider);
        self
    }

    pub fn with_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_override = Some(prompt.into());
        self
    }

    /// Deterministic cache key over every output-affecting field.
    ///
    /// Fields are serialized in a fixed alphabetical order
    /// (`concept`, `prompt`, `provider`, `side`, `tier`) before hashing,
    /// so the key is independent of construction order.
    pub fn content_key(&self) -> String {
        let provider = self
            .explicit_provider
            .map(|p| p.as_str())
            .unwrap_or("auto");
        let prompt = self.prompt_override.as_deref().unwrap_or("-");
        let canonical = format!(
            "concept={}|prompt={}|provider={}|side={}|tier={}",
            self.concept.as_str(),
            prompt,
            provider,
            self.side.as_str(),
            self.quality_tier.as_str(),
        );
        sha256_hex(canonical.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
