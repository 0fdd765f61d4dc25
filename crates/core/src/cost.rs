//! Unit cost model: (provider, quality tier) → estimated USD per image.
//!
//! The table is injected configuration rather than literals embedded in
//! the selection logic, so pricing changes do not touch routing code.

use serde::{Deserialize, Serialize};

use crate::provider::ProviderKind;
use crate::request::QualityTier;

/// Per-tier unit costs for a single provider, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierCosts {
    pub draft: f64,
    pub review: f64,
    pub production: f64,
}

impl TierCosts {
    /// A provider that charges the same for every tier.
    pub fn flat(cost: f64) -> Self {
        Self {
            draft: cost,
            review: cost,
            production: cost,
        }
    }

    fn for_tier(&self, tier: QualityTier) -> f64 {
        match tier {
            QualityTier::Draft => self.draft,
            QualityTier::Review => self.review,
            QualityTier::Production => self.production,
        }
    }
}

/// Cost lookup table covering every known provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTable {
    pub openai: TierCosts,
    pub gemini: TierCosts,
}

impl CostTable {
    /// Estimated unit cost for one image from `provider` at `tier`.
    pub fn unit_cost(&self, provider: ProviderKind, tier: QualityTier) -> f64 {
        match provider {
            ProviderKind::OpenAi => self.openai.for_tier(tier),
            ProviderKind::Gemini => self.gemini.for_tier(tier),
        }
    }
}

impl Default for CostTable {
    /// Published per-image pricing: GPT Image 1 low/medium/high quality,
    /// Gemini 2.5 Flash Image flat rate.
    fn default() -> Self {
        Self {
            openai: TierCosts {
                draft: 0.02,
                review: 0.07,
                production: 0.19,
            },
            gemini: TierCosts::flat(0.005),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_openai_costs_scale_with_tier() {
        let table = CostTable::default();
        assert_eq!(table.unit_cost(ProviderKind::OpenAi, QualityTier::Draft), 0.02);
        assert_eq!(table.unit_cost(ProviderKind::OpenAi, QualityTier::Review), 0.07);
        assert_eq!(
            table.unit_cost(ProviderKind::OpenAi, QualityTier::Production),
            0.19
        );
    }

    #[test]
    fn default_gemini_cost_is_flat() {
        let table = CostTable::default();
        for tier in [QualityTier::Draft, QualityTier::Review, QualityTier::Production] {
            assert_eq!(table.unit_cost(ProviderKind::Gemini, tier), 0.005);
        }
    }

    #[test]
    fn gemini_is_cheaper_than_openai_at_every_tier() {
        let table = CostTable::default();
        for tier in [QualityTier::Draft, QualityTier::Review, QualityTier::Production] {
            assert!(
                table.unit_cost(ProviderKind::Gemini, tier)
                    < table.unit_cost(ProviderKind::OpenAi, tier)
            );
        }
    }
}
