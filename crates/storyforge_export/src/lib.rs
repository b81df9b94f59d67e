//! Download and export of generated images.
//!
//! Images are either embedded `data:` URIs, decoded in place, or remote
//! URLs fetched through an [`ImageFetcher`](storyforge_interface::ImageFetcher).
//! Batches are packaged as a zip archive.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod exporter;
mod source;

pub use exporter::{
    ARCHIVE_FOLDER, Exporter, ImagePayload, archive_entry_name, archive_file_name,
    image_file_name,
};
pub use source::{DEFAULT_EXTENSION, ImageSource, extension_for_mime, extension_for_url};
