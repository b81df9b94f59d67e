//! Progressive compression of embedded image payloads.
//!
//! Persisted documents are dominated by `data:` URIs. When a write does not
//! fit, the archive re-encodes the same items at the next [`Compression`]
//! level and tries again. Only `url` fields holding `data:` URIs are
//! rewritten; every other field survives every level unchanged.

use serde::Serialize;
use serde_json::Value;
use storyforge_error::{StorageError, StorageErrorKind};

/// Field name holding an image location.
pub const URL_FIELD: &str = "url";

/// Characters of a data URI kept by [`Compression::Truncate`].
pub const TRUNCATE_CHARS: usize = 1000;

/// 1x1 transparent GIF substituted by [`Compression::Placeholder`].
pub const PLACEHOLDER_IMAGE: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// One level of the compression ladder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    strum::Display,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum Compression {
    /// Items stored as-is.
    #[default]
    None,
    /// Embedded images cut to their first [`TRUNCATE_CHARS`] characters.
    Truncate,
    /// Embedded images replaced by [`PLACEHOLDER_IMAGE`].
    Placeholder,
    /// Embedded image fields removed.
    Drop,
}

impl Compression {
    /// Levels in the order they are attempted.
    pub const LADDER: [Compression; 4] = [
        Compression::None,
        Compression::Truncate,
        Compression::Placeholder,
        Compression::Drop,
    ];

    /// The level tried after this one, if any.
    pub fn next(self) -> Option<Compression> {
        match self {
            Compression::None => Some(Compression::Truncate),
            Compression::Truncate => Some(Compression::Placeholder),
            Compression::Placeholder => Some(Compression::Drop),
            Compression::Drop => None,
        }
    }

    /// Apply this level to every embedded image in `value`, recursively.
    pub fn apply(self, value: &mut Value) {
        if self == Compression::None {
            return;
        }
        match value {
            Value::Array(items) => items.iter_mut().for_each(|v| self.apply(v)),
            Value::Object(map) => {
                let embedded = map
                    .get(URL_FIELD)
                    .and_then(Value::as_str)
                    .is_some_and(|url| url.starts_with("data:"));
                if embedded {
                    match self {
                        Compression::Truncate => {
                            if let Some(Value::String(url)) = map.get_mut(URL_FIELD) {
                                if let Some((cut, _)) = url.char_indices().nth(TRUNCATE_CHARS) {
                                    url.truncate(cut);
                                }
                            }
                        }
                        Compression::Placeholder => {
                            map.insert(
                                URL_FIELD.to_string(),
                                Value::String(PLACEHOLDER_IMAGE.to_string()),
                            );
                        }
                        Compression::Drop => {
                            map.remove(URL_FIELD);
                        }
                        Compression::None => {}
                    }
                }
                map.values_mut().for_each(|v| self.apply(v));
            }
            _ => {}
        }
    }
}

/// Serialize `items` as a JSON array at the given compression level.
pub fn encode<T: Serialize>(items: &[T], level: Compression) -> Result<String, StorageError> {
    let mut value = serde_json::to_value(items)
        .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))?;
    level.apply(&mut value);
    serde_json::to_string(&value)
        .map_err(|e| StorageError::new(StorageErrorKind::Serialization(e.to_string())))
}

/// Encode `items` at the first ladder level whose output fits in `budget` bytes.
///
/// # Returns
///
/// The chosen level and its encoding, or `None` when even
/// [`Compression::Drop`] is too large.
///
/// # Errors
///
/// Returns error if the items cannot be serialized.
pub fn encode_within_budget<T: Serialize>(
    items: &[T],
    budget: usize,
) -> Result<Option<(Compression, String)>, StorageError> {
    for level in Compression::LADDER {
        let json = encode(items, level)?;
        if json.len() <= budget {
            return Ok(Some((level, json)));
        }
        tracing::debug!(%level, size = json.len(), budget, "Encoding exceeds budget");
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truncate_respects_char_boundaries() {
        let payload: String = std::iter::repeat('é').take(TRUNCATE_CHARS + 10).collect();
        let mut value = json!([{ "url": format!("data:{}", payload), "seed": 7 }]);
        Compression::Truncate.apply(&mut value);
        let url = value[0]["url"].as_str().unwrap();
        assert_eq!(url.chars().count(), TRUNCATE_CHARS);
        assert_eq!(value[0]["seed"], 7);
    }

    #[test]
    fn remote_urls_are_left_alone() {
        let mut value = json!({ "url": "https://cdn.example/a.webp" });
        Compression::Drop.apply(&mut value);
        assert_eq!(value["url"], "https://cdn.example/a.webp");
    }

    fn batch(payload_chars: usize) -> Vec<serde_json::Value> {
        let payload: String = std::iter::repeat('A').take(payload_chars).collect();
        vec![json!({ "url": format!("data:image/webp;base64,{}", payload), "seed": 3 })]
    }

    fn size_at(items: &[serde_json::Value], level: Compression) -> usize {
        encode(items, level).unwrap().len()
    }

    #[test]
    fn ladder_follows_next() {
        let walked: Vec<Compression> =
            std::iter::successors(Some(Compression::None), |level| level.next()).collect();
        assert_eq!(walked, Compression::LADDER);
    }

    #[test]
    fn budget_picks_first_level_that_fits() {
        let items = batch(5000);
        let none = size_at(&items, Compression::None);
        let truncate = size_at(&items, Compression::Truncate);
        let placeholder = size_at(&items, Compression::Placeholder);
        let dropped = size_at(&items, Compression::Drop);
        assert!(none > truncate && truncate > placeholder && placeholder > dropped);

        for (budget, expected) in [
            (none, Compression::None),
            (none - 1, Compression::Truncate),
            (truncate - 1, Compression::Placeholder),
            (placeholder - 1, Compression::Drop),
        ] {
            let (level, json) = encode_within_budget(&items, budget).unwrap().unwrap();
            assert_eq!(level, expected, "budget {budget}");
            assert!(json.len() <= budget);
            assert_eq!(json, encode(&items, expected).unwrap());
        }
    }

    #[test]
    fn budget_below_every_level_is_none() {
        let items = batch(5000);
        let dropped = size_at(&items, Compression::Drop);
        assert_eq!(encode_within_budget(&items, dropped - 1).unwrap(), None);
    }

    #[test]
    fn nested_images_are_compressed() {
        let mut value = json!([{ "images": [{ "url": "data:image/webp;base64,AAAA" }] }]);
        Compression::Placeholder.apply(&mut value);
        assert_eq!(value[0]["images"][0]["url"], PLACEHOLDER_IMAGE);
    }
}
