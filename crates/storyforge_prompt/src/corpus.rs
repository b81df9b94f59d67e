//! Scene corpora and their persisted cache.

use serde::{Deserialize, Serialize};
use storyforge_core::CorpusCategory;

const FALLBACK_SOLO: &str = include_str!("../corpus/solo.txt");
const FALLBACK_COUPLE: &str = include_str!("../corpus/couple.txt");
const FALLBACK_DETAIL: &str = include_str!("../corpus/detail.txt");

/// The three newline-delimited corpora.
///
/// Serializes in the shape of the persisted corpus cache document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Corpus {
    /// Single-character lines
    #[serde(default)]
    pub solo: String,
    /// Two-character lines
    #[serde(default)]
    pub couple: String,
    /// Closing detail lines
    #[serde(default, rename = "afetex")]
    pub detail: String,
}

impl Corpus {
    /// Corpus bundled with the crate, used when the remote corpora are unavailable.
    pub fn fallback() -> Self {
        Self {
            solo: FALLBACK_SOLO.to_string(),
            couple: FALLBACK_COUPLE.to_string(),
            detail: FALLBACK_DETAIL.to_string(),
        }
    }

    /// Text for one category.
    pub fn get(&self, category: CorpusCategory) -> &str {
        match category {
            CorpusCategory::Solo => &self.solo,
            CorpusCategory::Couple => &self.couple,
            CorpusCategory::Detail => &self.detail,
        }
    }

    /// Whether every category has at least one non-blank line.
    pub fn is_complete(&self) -> bool {
        [&self.solo, &self.couple, &self.detail]
            .iter()
            .all(|text| text.lines().any(|line| !line.trim().is_empty()))
    }
}
