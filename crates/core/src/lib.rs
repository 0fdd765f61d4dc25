//! Domain types and pure logic for the cardforge generation engine.
//!
//! This crate has zero internal dependencies so it can be used by the
//! provider adapters, the orchestration engine, and any future CLI or
//! service tooling without dragging in transport or runtime concerns.

pub mod cost;
pub mod hashing;
pub mod prompt;
pub mod provider;
pub mod request;
pub mod result;
pub mod types;
pub mod validation;

pub use cost::CostTable;
pub use prompt::BrandProfile;
pub use provider::ProviderKind;
pub use request::{CardSide, Concept, GenerationRequest, QualityTier};
pub use result::{FailureKind, GenerationResult};
pub use validation::{validate_artifact, PrintRules, RuleViolation};
