//! Ordered list of scene descriptions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Delimiter used where scenes cross a text boundary (API payloads, persisted JSON).
pub const SCENE_DELIMITER: char = '/';

/// Ordered scene descriptions, one image prompt per entry.
///
/// Internally a list; it is joined with `/` only when handed to the
/// enhancement API or written to the persisted settings snapshot.
///
/// # Examples
///
/// ```
/// use storyforge_core::SceneList;
///
/// let scenes = SceneList::from_delimited("standing on a cliff / / sitting by a fire/");
/// assert_eq!(scenes.len(), 2);
/// assert_eq!(scenes.to_delimited(), "standing on a cliff/sitting by a fire");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SceneList(Vec<String>);

impl SceneList {
    /// Empty list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Split slash-delimited text, trimming entries and dropping blank ones.
    pub fn from_delimited(text: &str) -> Self {
        text.split(SCENE_DELIMITER).collect()
    }

    /// Join the entries with `/`.
    pub fn to_delimited(&self) -> String {
        self.0.join("/")
    }

    /// Number of scenes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no scenes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the scenes in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Append a scene; blank text is ignored.
    pub fn push(&mut self, scene: impl AsRef<str>) {
        let scene = scene.as_ref().trim();
        if !scene.is_empty() {
            self.0.push(scene.to_string());
        }
    }

    /// Borrow the scenes as a slice.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: AsRef<str>> FromIterator<S> for SceneList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = SceneList::new();
        for scene in iter {
            list.push(scene);
        }
        list
    }
}

impl From<Vec<String>> for SceneList {
    fn from(scenes: Vec<String>) -> Self {
        scenes.into_iter().collect()
    }
}

impl IntoIterator for SceneList {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a SceneList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for SceneList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_delimited())
    }
}

impl Serialize for SceneList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_delimited())
    }
}

impl<'de> Deserialize<'de> for SceneList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(SceneList::from_delimited(&text))
    }
}
