//! Metadata definitions: the templates metadata items are built from.
//!
//! A definition says how one named field behaves for every gallery object:
//! whether it is shown, whether users may edit it, whether edits are written
//! back to the file, where it sorts, and how a raw value is formatted.
//!
//! `format_string` wraps the raw value: `"f/{value}"` turns `2.8` into
//! `f/2.8`. `default_value` is used when the file carries no value and may
//! reference other fields of the object, e.g. `"{FileName}"`.

use crate::config::MetadataConfig;
use crate::null;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every metadata field the gallery knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MetadataItemName {
    NotSpecified,
    Title,
    Caption,
    Author,
    Copyright,
    Keywords,
    CameraMake,
    CameraModel,
    DateTaken,
    ExposureTime,
    FNumber,
    IsoSpeed,
    FocalLength,
    Orientation,
    Width,
    Height,
    FileName,
    FileSizeKb,
    DateAdded,
}

impl MetadataItemName {
    pub const ALL: [MetadataItemName; 18] = [
        Self::Title,
        Self::Caption,
        Self::Author,
        Self::Copyright,
        Self::Keywords,
        Self::CameraMake,
        Self::CameraModel,
        Self::DateTaken,
        Self::ExposureTime,
        Self::FNumber,
        Self::IsoSpeed,
        Self::FocalLength,
        Self::Orientation,
        Self::Width,
        Self::Height,
        Self::FileName,
        Self::FileSizeKb,
        Self::DateAdded,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotSpecified => "",
            Self::Title => "Title",
            Self::Caption => "Caption",
            Self::Author => "Author",
            Self::Copyright => "Copyright",
            Self::Keywords => "Keywords",
            Self::CameraMake => "Camera make",
            Self::CameraModel => "Camera model",
            Self::DateTaken => "Date taken",
            Self::ExposureTime => "Exposure time",
            Self::FNumber => "F-stop",
            Self::IsoSpeed => "ISO speed",
            Self::FocalLength => "Focal length",
            Self::Orientation => "Orientation",
            Self::Width => "Width",
            Self::Height => "Height",
            Self::FileName => "File name",
            Self::FileSizeKb => "File size",
            Self::DateAdded => "Date added",
        }
    }

    /// Token used in default-value templates, e.g. `{FileName}`.
    pub fn token(self) -> String {
        format!("{{{self:?}}}")
    }
}

/// How an editable value is edited in the surrounding web layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EditorMode {
    #[default]
    NotSet,
    PlainTextEditor,
    HtmlEditor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDefinition {
    pub name: MetadataItemName,
    pub display_name: String,
    pub default_value: String,
    pub is_visible_by_default: bool,
    pub is_editable: bool,
    pub editor_mode: EditorMode,
    pub persist_to_file: bool,
    pub sequence: i32,
    pub format_string: String,
    sentinel: bool,
}

impl MetadataDefinition {
    pub fn new(name: MetadataItemName, sequence: i32) -> Self {
        Self {
            name,
            display_name: name.label().to_string(),
            default_value: String::new(),
            is_visible_by_default: true,
            is_editable: false,
            editor_mode: EditorMode::NotSet,
            persist_to_file: false,
            sequence,
            format_string: String::new(),
            sentinel: false,
        }
    }

    /// The null definition. Prefer [`null::metadata_definition`] for the
    /// shared instance.
    pub fn null() -> Self {
        Self {
            is_visible_by_default: false,
            sequence: i32::MIN,
            sentinel: true,
            ..Self::new(MetadataItemName::NotSpecified, 0)
        }
    }

    pub fn is_null(&self) -> bool {
        self.sentinel
    }

    fn editable(mut self, mode: EditorMode) -> Self {
        self.is_editable = true;
        self.editor_mode = mode;
        self
    }

    fn persisted(mut self) -> Self {
        self.persist_to_file = true;
        self
    }

    fn hidden(mut self) -> Self {
        self.is_visible_by_default = false;
        self
    }

    fn formatted(mut self, format: &str) -> Self {
        self.format_string = format.to_string();
        self
    }

    fn defaulting_to(mut self, template: &str) -> Self {
        self.default_value = template.to_string();
        self
    }

    /// Display value for a raw value.
    pub fn format(&self, raw: &str) -> String {
        if self.format_string.is_empty() || raw.is_empty() {
            raw.to_string()
        } else {
            self.format_string.replace("{value}", raw)
        }
    }

    /// Expand `{Token}` references in the default value.
    pub fn expand_default(&self, values: &BTreeMap<MetadataItemName, String>) -> String {
        let mut expanded = self.default_value.clone();
        if !expanded.contains('{') {
            return expanded;
        }
        for (name, value) in values {
            expanded = expanded.replace(&name.token(), value);
        }
        expanded
    }
}

/// Definitions for every field, ordered by sequence.
#[derive(Debug, Clone)]
pub struct MetadataDefinitionCollection {
    definitions: Vec<MetadataDefinition>,
}

impl MetadataDefinitionCollection {
    /// Stock definitions.
    pub fn stock() -> Self {
        use MetadataItemName as N;
        let definitions = vec![
            MetadataDefinition::new(N::Title, 0)
                .editable(EditorMode::HtmlEditor)
                .defaulting_to("{FileName}"),
            MetadataDefinition::new(N::Caption, 1)
                .editable(EditorMode::HtmlEditor)
                .persisted(),
            MetadataDefinition::new(N::Author, 2)
                .editable(EditorMode::PlainTextEditor)
                .persisted(),
            MetadataDefinition::new(N::Copyright, 3)
                .editable(EditorMode::PlainTextEditor)
                .persisted(),
            MetadataDefinition::new(N::Keywords, 4).editable(EditorMode::PlainTextEditor),
            MetadataDefinition::new(N::DateTaken, 5),
            MetadataDefinition::new(N::CameraMake, 6),
            MetadataDefinition::new(N::CameraModel, 7),
            MetadataDefinition::new(N::ExposureTime, 8).formatted("{value} sec"),
            MetadataDefinition::new(N::FNumber, 9).formatted("f/{value}"),
            MetadataDefinition::new(N::IsoSpeed, 10).formatted("ISO {value}"),
            MetadataDefinition::new(N::FocalLength, 11).formatted("{value} mm"),
            MetadataDefinition::new(N::Width, 12).formatted("{value} px"),
            MetadataDefinition::new(N::Height, 13).formatted("{value} px"),
            MetadataDefinition::new(N::FileName, 14),
            MetadataDefinition::new(N::FileSizeKb, 15).formatted("{value} KB"),
            MetadataDefinition::new(N::DateAdded, 16),
            MetadataDefinition::new(N::Orientation, 17).hidden(),
        ];
        Self::from_definitions(definitions)
    }

    /// Stock definitions with configured visibility applied.
    pub fn from_config(config: &MetadataConfig) -> Self {
        let mut collection = Self::stock();
        for definition in &mut collection.definitions {
            if config.hidden_items.contains(&definition.name) {
                definition.is_visible_by_default = false;
            }
        }
        collection
    }

    pub fn from_definitions(mut definitions: Vec<MetadataDefinition>) -> Self {
        definitions.sort_by_key(|d| (d.sequence, d.name));
        Self { definitions }
    }

    /// Definition for `name`, or the null definition.
    pub fn get(&self, name: MetadataItemName) -> &MetadataDefinition {
        self.definitions
            .iter()
            .find(|d| d.name == name)
            .unwrap_or(null::metadata_definition())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for MetadataDefinitionCollection {
    fn default() -> Self {
        Self::stock()
    }
}
