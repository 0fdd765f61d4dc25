//! Provider selection.
//!
//! A pure, total function over the request and the current availability
//! flags. Never performs I/O, never randomizes, so the same inputs always
//! route to the same provider.

use cardforge_core::provider::FALLBACK_ORDER;
use cardforge_core::{ProviderKind, QualityTier};

use crate::availability::AvailabilityMap;

/// The provider a tier prefers when the caller has not pinned one.
///
/// Production pays for GPT Image 1 quality; draft and review iterate on
/// the cheap, fast Gemini tier.
pub fn tier_preferred(tier: QualityTier) -> ProviderKind {
    match tier {
        QualityTier::Production => ProviderKind::OpenAi,
        QualityTier::Draft | QualityTier::Review => ProviderKind::Gemini,
    }
}

/// Choose a provider for one call attempt.
///
/// Precedence: the explicitly pinned provider when selectable, then the
/// tier-preferred provider, then the remaining providers in the fixed
/// fallback order. `excluded` removes the provider that just failed this
/// job from consideration. `None` means no call should be attempted.
pub fn select_provider(
    tier: QualityTier,
    explicit: Option<ProviderKind>,
    availability: &AvailabilityMap,
    excluded: Option<ProviderKind>,
) -> Option<ProviderKind> {
    let selectable =
        |p: ProviderKind| availability.is_selectable(p) && Some(p) != excluded;

    if let Some(pinned) = explicit {
        if selectable(pinned) {
            return Some(pinned);
        }
    }

    let preferred = tier_preferred(tier);
    if selectable(preferred) {
        return Some(preferred);
    }

    FALLBACK_ORDER.into_iter().find(|&p| selectable(p))
}
