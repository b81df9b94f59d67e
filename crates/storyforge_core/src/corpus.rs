//! Scene corpus categories.

use serde::{Deserialize, Serialize};

/// The three text corpora scene lines are drawn from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CorpusCategory {
    /// Single-character poses, sampled by `start`
    Solo,
    /// Two-character poses, sampled by `mid`
    Couple,
    /// Closing detail lines, sampled by `end`
    Detail,
}
