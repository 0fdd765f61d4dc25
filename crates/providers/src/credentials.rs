//! Credential discovery and plausibility checks.
//!
//! Keys are read from the environment once at startup. The format checks
//! are deliberately shallow (prefix and length only) — their job is to
//! catch pasted-in placeholders and truncated keys before any paid call,
//! not to authenticate.

use std::env;

use cardforge_core::ProviderKind;

/// Minimum plausible key length for either provider.
const MIN_KEY_LEN: usize = 20;

// ---------------------------------------------------------------------------
// KeyStatus
// ---------------------------------------------------------------------------

/// The result of checking one provider's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Present and passes the shape check.
    Available,
    /// No key found in the environment.
    Missing,
    /// Present but does not look like a real key for this provider.
    InvalidFormat,
}

impl KeyStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, KeyStatus::Available)
    }
}

/// Check an OpenAI API key: `sk-` prefix and a plausible length.
pub fn check_openai_key(key: Option<&str>) -> KeyStatus {
    match key {
        None => KeyStatus::Missing,
        Some(k) if k.trim().is_empty() => KeyStatus::Missing,
        Some(k) if k.starts_with("sk-") && k.len() >= MIN_KEY_LEN => KeyStatus::Available,
        Some(_) => KeyStatus::InvalidFormat,
    }
}

/// Check a Gemini API key: `AIza` prefix and a plausible length.
pub fn check_gemini_key(key: Option<&str>) -> KeyStatus {
    match key {
        None => KeyStatus::Missing,
        Some(k) if k.trim().is_empty() => KeyStatus::Missing,
        Some(k) if k.starts_with("AIza") && k.len() >= MIN_KEY_LEN => KeyStatus::Available,
        Some(_) => KeyStatus::InvalidFormat,
    }
}

// ---------------------------------------------------------------------------
// ProviderCredentials
// ---------------------------------------------------------------------------

/// API keys discovered from the environment, one slot per provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai_key: Option<String>,
    pub gemini_key: Option<String>,
}

impl ProviderCredentials {
    /// Read keys from the environment.
    ///
    /// OpenAI: `OPENAI_API_KEY`. Gemini: `GOOGLE_API_KEY`, falling back to
    /// `GEMINI_API_KEY`. Keys that fail the shape check are kept (the
    /// provider will report an auth failure on first use) but logged.
    pub fn from_env() -> Self {
        let openai_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let gemini_key = env::var("GOOGLE_API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());

        let creds = Self {
            openai_key,
            gemini_key,
        };
        for provider in ProviderKind::all() {
            match creds.status_for(*provider) {
                KeyStatus::Available => {
                    tracing::info!(provider = %provider, "api key present");
                }
                KeyStatus::Missing => {
                    tracing::warn!(provider = %provider, "no api key configured");
                }
                KeyStatus::InvalidFormat => {
                    tracing::warn!(provider = %provider, "api key has unexpected format");
                }
            }
        }
        creds
    }

    /// Shape-check the stored key for one provider.
    pub fn status_for(&self, provider: ProviderKind) -> KeyStatus {
        match provider {
            ProviderKind::OpenAi => check_openai_key(self.openai_key.as_deref()),
            ProviderKind::Gemini => check_gemini_key(self.gemini_key.as_deref()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
