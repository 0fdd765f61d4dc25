//! Deterministic prompt assembly for card generation.
//!
//! Builds a provider-agnostic prompt from an injected [`BrandProfile`],
//! the requested concept, and the card side. The same inputs always
//! produce the same prompt text, which keeps content keys stable.

use serde::{Deserialize, Serialize};

use crate::request::{CardSide, Concept, GenerationRequest};

// ---------------------------------------------------------------------------
// Color system
// ---------------------------------------------------------------------------

/// Deep matte black background.
pub const COLOR_BACKGROUND: &str = "#0A0A0A";
/// Single emerald accent for highlights only.
pub const COLOR_ACCENT: &str = "#00C9A7";
/// Arctic white text for maximum contrast.
pub const COLOR_TEXT: &str = "#FAFAFA";

// ---------------------------------------------------------------------------
// BrandProfile
// ---------------------------------------------------------------------------

/// Brand identity injected into every assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandProfile {
    pub name: String,
    pub company: String,
    pub tagline: String,
    pub email: String,
    pub website: String,
    pub location: String,
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            name: "Alex Shafiro PT / DPT / OCS / CSCS".into(),
            company: "A Stronger Life".into(),
            tagline: "Revolutionary Rehabilitation".into(),
            email: "admin@aslstrong.com".into(),
            website: "www.aslstrong.com".into(),
            location: "Stamford, CT".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Build the full prompt for a request, honoring any prompt override.
pub fn prompt_for(request: &GenerationRequest, profile: &BrandProfile) -> String {
    if let Some(ref override_text) = request.prompt_override {
        return override_text.clone();
    }
    build_prompt(profile, &request.concept, request.side)
}

/// Assemble the universal card prompt for a concept and side.
pub fn build_prompt(profile: &BrandProfile, concept: &Concept, side: CardSide) -> String {
    let base = format!(
        "Professional business card design for premium rehabilitation practice:\n\
         \n\
         CRITICAL SPECIFICATIONS:\n\
         - Completely flat 2D design (NO 3D mockups, NO shadows, NO perspective)\n\
         - Business card proportions: 3.5\" x 2.0\"\n\
         - Deep matte black background ({COLOR_BACKGROUND})\n\
         - Single emerald accent color ({COLOR_ACCENT}) for highlights only\n\
         - Arctic white text ({COLOR_TEXT}) for maximum contrast\n\
         - \"Equinox meets Mayo Clinic\" aesthetic - sophisticated restraint\n\
         \n\
         BRAND INFORMATION:\n\
         Name: {name}\n\
         Company: {company}\n\
         Tagline: {tagline}\n\
         Email: {email}\n\
         Website: {website}\n\
         Location: {location}",
        name = profile.name,
        company = profile.company,
        tagline = profile.tagline,
        email = profile.email,
        website = profile.website,
        location = profile.location,
    );

    let layout = match side {
        CardSide::Front => {
            "\nFRONT CARD LAYOUT:\n\
             - Logo area (top-left): company logo placeholder\n\
             - Name/title block (center-left): primary prominence for name\n\
             - Contact information (left column): phone, email, website, location\n\
             - QR code area (bottom-right): small QR code placeholder\n\
             - Professional hierarchy with generous negative space"
        }
        CardSide::Back => {
            "\nBACK CARD LAYOUT:\n\
             - Centered tagline in bold uppercase lettering with increased letter spacing\n\
             - Optional: subtle company logo watermark at 3% opacity maximum\n\
             - Maximum negative space for sophisticated impact"
        }
    };

    let style = match concept {
        Concept::ClinicalPrecision => {
            "Medical authority focus, symmetric layout, clinical trust"
        }
        Concept::AthleticEdge => "Dynamic energy, performance-focused design elements",
        Concept::LuxuryWellness => "Equinox-level luxury, spa-like sophistication",
        Concept::Custom(_) => "Premium professional",
    };

    format!(
        "{base}\n{layout}\nDESIGN CONCEPT: {style}\n\n\
         OUTPUT: Flat artboard design ready for professional printing."
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::QualityTier;

    #[test]
    fn prompt_is_deterministic() {
        let profile = BrandProfile::default();
        let a = build_prompt(&profile, &Concept::ClinicalPrecision, CardSide::Front);
        let b = build_prompt(&profile, &Concept::ClinicalPrecision, CardSide::Front);
        assert_eq!(a, b);
    }

    #[test]
    fn front_and_back_layouts_differ() {
        let profile = BrandProfile::default();
        let front = build_prompt(&profile, &Concept::AthleticEdge, CardSide::Front);
        let back = build_prompt(&profile, &Concept::AthleticEdge, CardSide::Back);
        assert_ne!(front, back);
        assert!(front.contains("FRONT CARD LAYOUT"));
        assert!(back.contains("BACK CARD LAYOUT"));
    }

    #[test]
    fn prompt_embeds_brand_fields() {
        let profile = BrandProfile {
            company: "Acme Physio".into(),
            ..BrandProfile::default()
        };
        let prompt = build_prompt(&profile, &Concept::LuxuryWellness, CardSide::Front);
        assert!(prompt.contains("Acme Physio"));
        assert!(prompt.contains(COLOR_ACCENT));
    }

    #[test]
    fn concept_styles_are_distinct() {
        let profile = BrandProfile::default();
        let clinical = build_prompt(&profile, &Concept::ClinicalPrecision, CardSide::Front);
        let athletic = build_prompt(&profile, &Concept::AthleticEdge, CardSide::Front);
        assert_ne!(clinical, athletic);
    }

    #[test]
    fn custom_concept_uses_generic_style() {
        let profile = BrandProfile::default();
        let prompt = build_prompt(&profile, &Concept::Custom("brutalist".into()), CardSide::Back);
        assert!(prompt.contains("Premium professional"));
    }

    #[test]
    fn override_bypasses_assembly() {
        let profile = BrandProfile::default();
        let request = GenerationRequest::new(
            Concept::ClinicalPrecision,
            CardSide::Front,
            QualityTier::Draft,
        )
        .with_prompt_override("just a green square");
        assert_eq!(prompt_for(&request, &profile), "just a green square");
    }
}
