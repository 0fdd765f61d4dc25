//! Provider adapters for external image-generation services.
//!
//! Each adapter owns all protocol-specific framing for one provider and
//! normalizes responses into a single internal outcome type. Ordinary
//! provider failures never surface as errors — they are classified into
//! the shared failure taxonomy and returned as values.

pub mod adapter;
pub mod credentials;
pub mod gemini;
pub mod openai;

pub use adapter::{AdapterOutcome, ProviderAdapter};
pub use credentials::{KeyStatus, ProviderCredentials};
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
