//! Metadata: definitions, items, the reader collaborator and source
//! resolution.
//!
//! | Piece | Role |
//! |---|---|
//! | [`MetadataDefinition`] | configuration template per field |
//! | [`MetadataItem`] | derived value owned by a gallery object |
//! | [`MetadataReader`] | reads raw values from files, writes edits back |
//! | [`resolve`] | picks a title/caption among competing sources |

pub mod definition;
pub mod item;
pub mod reader;
pub mod resolve;

pub use definition::{EditorMode, MetadataDefinition, MetadataDefinitionCollection, MetadataItemName};
pub use item::{MetadataItem, MetadataItemCollection};
pub use reader::{EmbeddedMetadataReader, MetadataError, MetadataReader, RawMetadata};
