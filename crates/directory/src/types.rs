//! The handoff object between extractor and formatter.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// One allow-listed group and its eligible sub-channel names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DirectorySection {
    /// Rendered with the allow-list's casing, not the server's.
    pub name: String,
    pub channels: Vec<String>,
}

/// Ordered extraction output plus its generation timestamp. Rebuilt from
/// scratch on every run; never cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub generated_at: DateTime<Utc>,
    pub sections: Vec<DirectorySection>,
}

impl ExtractionResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
