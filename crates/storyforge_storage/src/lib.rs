//! Persistence for Storyforge.
//!
//! This crate provides:
//! - [`KeyValueStore`]: whole-document string storage with a quota
//! - [`InMemoryStore`] and [`FileSystemStore`] backends
//! - The [`Compression`] ladder that shrinks embedded images to fit
//! - [`Archive`]: capped generation history and image trash

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod archive;
mod compression;
mod filesystem;
mod memory;
mod store;

pub use archive::{
    Archive, ArchiveConfig, ArchiveConfigBuilder, HISTORY_KEY, PersistOutcome, TRASH_KEY,
};
pub use compression::{
    Compression, PLACEHOLDER_IMAGE, TRUNCATE_CHARS, URL_FIELD, encode, encode_within_budget,
};
pub use filesystem::FileSystemStore;
pub use memory::InMemoryStore;
pub use store::KeyValueStore;
