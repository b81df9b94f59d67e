//! Image generation API request and response types.

use derive_builder::Builder;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// Payload sent to the image generation API.
///
/// # Examples
///
/// ```
/// use storyforge_core::ImageRequest;
///
/// let request = ImageRequest::builder()
///     .character_prompt("[Aria], forest")
///     .scene_prompts("[Aria], walking")
///     .hiresfixprompt("walking")
///     .width(1344u32)
///     .height(768u32)
///     .seed(7u64)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.image_format(), "webp");
/// assert_eq!(request.mime_type(), "image/webp");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Getters)]
#[builder(setter(into))]
pub struct ImageRequest {
    /// Character prompt
    character_prompt: String,
    /// Per-scene prompts joined by `";\n"`
    scene_prompts: String,
    /// Refinement prompts joined by `" / "`
    hiresfixprompt: String,
    /// Negative prompt
    #[builder(default)]
    negative_prompt: String,
    /// Output width in pixels
    width: u32,
    /// Output height in pixels
    height: u32,
    /// Batch seed
    seed: u64,
    /// Output encoding (`webp`, `png`, `jpg`)
    #[builder(default = "\"webp\".to_string()")]
    image_format: String,
    /// Ask the server to shrink output
    #[builder(default = "true")]
    optimize_size: bool,
    /// Encoder quality hint
    #[builder(default = "\"85\".to_string()")]
    image_quality: String,
    /// Lora reference
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    lora_air: Option<String>,
}

impl ImageRequest {
    /// Creates a new builder for `ImageRequest`.
    pub fn builder() -> ImageRequestBuilder {
        ImageRequestBuilder::default()
    }

    /// MIME type of the requested output format.
    pub fn mime_type(&self) -> String {
        mime_for_format(&self.image_format)
    }
}

/// MIME type for an image format name (`jpg` maps to `image/jpeg`).
pub fn mime_for_format(format: &str) -> String {
    let format = format.trim().to_lowercase();
    match format.as_str() {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        other => format!("image/{}", other),
    }
}

/// Images returned by the generation API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
pub struct ImageResponse {
    /// Base64-encoded images, or URLs when the server hosts them
    #[serde(default)]
    images: Vec<String>,
    /// Server-assigned request id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl ImageResponse {
    /// Build a response from raw image payloads.
    pub fn new(images: Vec<String>, request_id: Option<String>) -> Self {
        Self { images, request_id }
    }

    /// Display URLs for every image.
    ///
    /// Payloads that already look like URLs are passed through; everything
    /// else is wrapped in a base64 data URI of the given MIME type.
    pub fn to_view_urls(&self, mime_type: &str) -> Vec<String> {
        self.images
            .iter()
            .filter(|payload| !payload.trim().is_empty())
            .map(|payload| {
                let payload = payload.trim();
                if payload.starts_with("data:")
                    || payload.starts_with("http://")
                    || payload.starts_with("https://")
                {
                    payload.to_string()
                } else {
                    format!("data:{};base64,{}", mime_type, payload)
                }
            })
            .collect()
    }
}
