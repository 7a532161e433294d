// Tracked link model and the admin form payloads that carry links

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::validation::trim_optional_field;

/// Store namespace for tracked links: `streamtape_urls/<url>` -> `<url>`
pub const URL_NAMESPACE: &str = "streamtape_urls";

/// Host substring every tracked link must contain
pub const REQUIRED_HOST: &str = "streamtape.com";

// =============================================================================
// TRACKED URL
// =============================================================================

/// A link accepted for keep-alive pinging.
///
/// Normalization is limited to trimming surrounding whitespace. Case, trailing
/// slashes and query strings are kept as entered, so `https://streamtape.com/v/a`
/// and `https://streamtape.com/v/a/` are two different tracked links.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedUrl(String);

impl TrackedUrl {
    /// Normalize and validate raw input. Returns `None` when the trimmed input is
    /// empty or does not mention the required host.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.contains(REQUIRED_HOST) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Build a tracked url from a value already read back from the store
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Store key for this link
    pub fn store_key(&self) -> String {
        store_key_for(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TrackedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Store key for an arbitrary (already trimmed) url string.
/// Deletion goes through this so links can be removed whatever they contain.
pub fn store_key_for(url: &str) -> String {
    format!("{}/{}", URL_NAMESPACE, url)
}

/// Prefix used to enumerate every tracked link
pub fn namespace_prefix() -> String {
    format!("{}/", URL_NAMESPACE)
}

/// Split newline-delimited input into candidate links, trimming each line and
/// dropping the ones that fail validation. Order of the input is kept.
pub fn parse_bulk(text: &str) -> (Vec<TrackedUrl>, usize) {
    let mut accepted = Vec::new();
    let mut skipped = 0;

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match TrackedUrl::parse(line) {
            Some(url) => accepted.push(url),
            None => skipped += 1,
        }
    }

    (accepted, skipped)
}

// =============================================================================
// REQUEST PAYLOADS
// =============================================================================

// Every field is optional so a missing token is reported as 403 by the token
// check instead of a form extraction error.

/// POST /add and POST /delete
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LinkForm {
    /// Trimmed url field, `None` when missing or blank
    pub fn url(&self) -> Option<String> {
        trim_optional_field(self.url.as_ref())
    }
}

/// POST /bulk-add
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkAddForm {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub urls: Option<String>,
}

/// POST /run-now
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    pub token: Option<String>,
}

/// GET /admin query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub added: Option<String>,
}

/// Result of a bulk insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BulkAddOutcome {
    pub added: usize,
    pub skipped: usize,
}
