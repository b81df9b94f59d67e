//! Where an image's bytes come from.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use storyforge_error::{ExportError, ExportErrorKind};

/// Extension used when the image type cannot be determined.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// An image's bytes, either embedded in a data URI or behind a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource<'a> {
    /// Decoded `data:` URI payload
    Embedded {
        /// MIME type from the URI header
        mime: String,
        /// Decoded bytes
        data: Vec<u8>,
    },
    /// URL to download
    Remote(&'a str),
}

impl<'a> ImageSource<'a> {
    /// Classify `url`, decoding it if it is a data URI.
    ///
    /// # Errors
    ///
    /// Returns [`ExportErrorKind::InvalidDataUri`] for a malformed data URI,
    /// and [`ExportErrorKind::NotFound`] for an empty URL (an image whose
    /// data was dropped from storage).
    ///
    /// # Examples
    ///
    /// ```
    /// use storyforge_export::ImageSource;
    ///
    /// let source = ImageSource::parse("data:image/png;base64,AQID").unwrap();
    /// assert_eq!(source, ImageSource::Embedded { mime: "image/png".into(), data: vec![1, 2, 3] });
    ///
    /// assert_eq!(ImageSource::parse("https://x/y.webp").unwrap(), ImageSource::Remote("https://x/y.webp"));
    /// ```
    pub fn parse(url: &'a str) -> Result<Self, ExportError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ExportError::new(ExportErrorKind::NotFound(
                "image has no data".to_string(),
            )));
        }

        let Some(rest) = url.strip_prefix("data:") else {
            return Ok(ImageSource::Remote(url));
        };

        let invalid = |reason: &str| {
            let preview: String = url.chars().take(40).collect();
            ExportError::new(ExportErrorKind::InvalidDataUri(format!(
                "{} ({}...)",
                reason, preview
            )))
        };

        let (header, payload) = rest.split_once(',').ok_or_else(|| invalid("missing comma"))?;
        let (mime, is_base64) = match header.strip_suffix(";base64") {
            Some(mime) => (mime, true),
            None => (header, false),
        };
        let mime = mime.split(';').next().unwrap_or_default().trim();
        let mime = if mime.is_empty() { "text/plain" } else { mime };

        let data = if is_base64 {
            STANDARD
                .decode(payload.trim())
                .map_err(|e| invalid(&format!("bad base64: {}", e)))?
        } else {
            payload.as_bytes().to_vec()
        };

        Ok(ImageSource::Embedded {
            mime: mime.to_string(),
            data,
        })
    }
}

/// File extension for an image MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/png" => "png",
        "image/gif" => "gif",
        _ => DEFAULT_EXTENSION,
    }
}

/// File extension implied by a remote URL's path.
pub fn extension_for_url(url: &str) -> &'static str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let ext = path
        .rsplit_once('/')
        .map(|(_, file)| file)
        .and_then(|file| file.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpeg" | "jpg") => "jpg",
        Some("webp") => "webp",
        Some("png") => "png",
        Some("gif") => "gif",
        _ => DEFAULT_EXTENSION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_extensions() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("image/WEBP"), "webp");
        assert_eq!(extension_for_mime("application/octet-stream"), "jpg");
    }

    #[test]
    fn url_extensions() {
        assert_eq!(extension_for_url("https://a/b/c.PNG?x=1"), "png");
        assert_eq!(extension_for_url("https://picsum.photos/seed/1/800/600"), "jpg");
    }

    #[test]
    fn raw_payload_and_bad_base64() {
        let raw = ImageSource::parse("data:image/svg+xml,<svg/>").unwrap();
        assert_eq!(
            raw,
            ImageSource::Embedded {
                mime: "image/svg+xml".to_string(),
                data: b"<svg/>".to_vec()
            }
        );
        assert!(ImageSource::parse("data:image/png;base64,@@@").is_err());
        assert!(ImageSource::parse("data:image/png;base64").is_err());
        assert!(ImageSource::parse("  ").is_err());
    }
}
