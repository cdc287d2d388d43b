//! # Gallery Core
//!
//! Domain model for a media gallery: albums and media items, their rendition
//! files, mime types and metadata. Lookups never hand back "nothing": a missing
//! object, display object, mime type or metadata entry is a shared null
//! instance carrying sentinel values ([`object::ID_NOT_SET`],
//! [`object::DATE_NOT_SET`], empty strings), so callers can walk parent chains
//! and read properties without checking for absence at every step.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`gallery`] | The [`Gallery`] context: collaborators, config, registries, cached lookups, factories |
//! | [`object`] | `GalleryObject`: inflation, writability, save/delete, tree operations, metadata extraction |
//! | [`display`] | `DisplayObject`: one physical or external rendition of a media item |
//! | [`mime`] | Extension → `MimeType` registry and browser-specific media templates |
//! | [`metadata`] | Metadata definitions, items, resolution and the reader collaborator |
//! | [`null`] | Shared null instances |
//! | [`store`] | `GalleryStore` trait and the in-memory store |
//! | [`fs`] | `FileSystem` trait and the local implementation |
//! | [`html`] | `HtmlValidator` trait and the allow-list validator |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, thumbnail, IPTC/EXIF |
//! | [`orientation`] | EXIF orientation and the rotate/flip needed to display upright |
//! | [`naming`] | `NNN-name` file names, rendition names, unique paths |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`logging`] | `tracing` subscriber setup |
//! | [`output`] | CLI output formatting |
//! | [`error`] | `GalleryError` |
//!
//! # Reads and Writes
//!
//! [`Gallery::get`] returns a shared, read-only `Arc<GalleryObject>` from a
//! cache. Changes go through [`Gallery::load_writable`], which returns an
//! owned instance whose `save` and `delete` invalidate the cache. Writing to
//! a read-only instance is an error, never a silent no-op.

pub mod config;
pub mod display;
pub mod error;
pub mod fs;
pub mod gallery;
pub mod html;
pub mod imaging;
pub mod logging;
pub mod metadata;
pub mod mime;
pub mod naming;
pub mod null;
pub mod object;
pub mod orientation;
pub mod output;
pub mod store;

pub use error::GalleryError;
pub use gallery::Gallery;

#[cfg(test)]
pub(crate) mod test_helpers;
