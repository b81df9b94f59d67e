//! Image size presets accepted by the generation API.

use serde::{Deserialize, Serialize};
use storyforge_error::{ValidationError, ValidationErrorKind};

/// Fixed pixel dimensions offered for generation.
///
/// Serialized as the `WIDTHxHEIGHT` label used by the settings form.
///
/// # Examples
///
/// ```
/// use storyforge_core::ImageSize;
///
/// let size: ImageSize = "1344x768".parse().unwrap();
/// assert_eq!(size.width(), 1344);
/// assert_eq!(size.height(), 768);
/// assert_eq!(size.to_string(), "1344x768");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum ImageSize {
    /// 1344×768
    #[default]
    #[serde(rename = "1344x768")]
    #[strum(serialize = "1344x768")]
    Landscape,
    /// 768×1344
    #[serde(rename = "768x1344")]
    #[strum(serialize = "768x1344")]
    Portrait,
    /// 836×1216
    #[serde(rename = "836x1216")]
    #[strum(serialize = "836x1216")]
    SquareIsh,
}

impl ImageSize {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            ImageSize::Landscape => (1344, 768),
            ImageSize::Portrait => (768, 1344),
            ImageSize::SquareIsh => (836, 1216),
        }
    }

    /// Human-readable label for menus.
    pub fn label(&self) -> &'static str {
        match self {
            ImageSize::Landscape => "Landscape (1344×768)",
            ImageSize::Portrait => "Portrait (768×1344)",
            ImageSize::SquareIsh => "Square-ish (836×1216)",
        }
    }
}

impl std::str::FromStr for ImageSize {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1344x768" => Ok(ImageSize::Landscape),
            "768x1344" => Ok(ImageSize::Portrait),
            "836x1216" => Ok(ImageSize::SquareIsh),
            other => Err(ValidationError::new(ValidationErrorKind::UnknownImageSize(
                other.to_string(),
            ))),
        }
    }
}
