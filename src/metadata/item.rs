//! Metadata items and the per-object collection that holds them.

use super::definition::{MetadataDefinition, MetadataItemName};
use crate::html::{HtmlValidator, ValidationResult};
use crate::null;
use crate::object::ID_NOT_SET;
use serde::Serialize;

/// One named metadata value attached to a gallery object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataItem {
    name: MetadataItemName,
    description: String,
    raw_value: String,
    value: String,
    is_visible: bool,
    is_editable: bool,
    persist_to_file: bool,
    media_object_id: i64,
    #[serde(skip)]
    has_changes: bool,
    #[serde(skip)]
    sentinel: bool,
}

impl MetadataItem {
    /// The null item. Prefer [`null::metadata_item`] for the shared instance.
    pub fn null() -> Self {
        Self {
            name: MetadataItemName::NotSpecified,
            description: String::new(),
            raw_value: String::new(),
            value: String::new(),
            is_visible: false,
            is_editable: false,
            persist_to_file: false,
            media_object_id: ID_NOT_SET,
            has_changes: false,
            sentinel: true,
        }
    }

    /// Build an item from its definition. The display value is the raw value
    /// run through the definition's format string. New items are clean: they
    /// match their source until edited.
    pub fn from_definition(definition: &MetadataDefinition, media_object_id: i64, raw: &str) -> Self {
        Self {
            name: definition.name,
            description: definition.display_name.clone(),
            raw_value: raw.to_string(),
            value: definition.format(raw),
            is_visible: definition.is_visible_by_default,
            is_editable: definition.is_editable,
            persist_to_file: definition.persist_to_file,
            media_object_id,
            has_changes: false,
            sentinel: false,
        }
    }

    pub fn is_null(&self) -> bool {
        self.sentinel
    }

    pub fn name(&self) -> MetadataItemName {
        self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_visible(&self) -> bool {
        self.is_visible
    }

    pub fn is_editable(&self) -> bool {
        self.is_editable
    }

    pub fn persist_to_file(&self) -> bool {
        self.persist_to_file
    }

    pub fn media_object_id(&self) -> i64 {
        self.media_object_id
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub(crate) fn mark_clean(&mut self) {
        self.has_changes = false;
    }

    pub(crate) fn set_media_object_id(&mut self, id: i64) {
        if !self.sentinel {
            self.media_object_id = id;
        }
    }

    /// Replace the value of an editable item.
    ///
    /// The value is validated first; a rejected value leaves the item
    /// unchanged and the result says why. The null item accepts nothing and
    /// reports valid.
    pub fn set_value(&mut self, value: &str, validator: &dyn HtmlValidator) -> ValidationResult {
        if self.sentinel {
            return ValidationResult::valid();
        }
        if !self.is_editable {
            return ValidationResult {
                is_valid: false,
                ..ValidationResult::default()
            };
        }
        let result = validator.validate(value);
        if result.is_valid {
            self.raw_value = value.to_string();
            self.value = value.to_string();
            self.has_changes = true;
        }
        result
    }
}

/// Items of one gallery object, keyed by name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataItemCollection {
    items: Vec<MetadataItem>,
}

impl MetadataItemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Item named `name`, or the null item.
    pub fn get(&self, name: MetadataItemName) -> &MetadataItem {
        self.find(name).unwrap_or(null::metadata_item())
    }

    pub fn find(&self, name: MetadataItemName) -> Option<&MetadataItem> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn find_mut(&mut self, name: MetadataItemName) -> Option<&mut MetadataItem> {
        self.items.iter_mut().find(|i| i.name == name)
    }

    /// Insert, or replace the item of the same name in place. Returns true
    /// when an item was replaced. Null items are ignored.
    pub fn upsert(&mut self, item: MetadataItem) -> bool {
        if item.sentinel {
            return false;
        }
        match self.find_mut(item.name) {
            Some(existing) => {
                *existing = item;
                true
            }
            None => {
                self.items.push(item);
                false
            }
        }
    }

    pub fn remove(&mut self, name: MetadataItemName) -> Option<MetadataItem> {
        let index = self.items.iter().position(|i| i.name == name)?;
        Some(self.items.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetadataItem> {
        self.items.iter()
    }

    pub fn visible(&self) -> impl Iterator<Item = &MetadataItem> {
        self.items.iter().filter(|i| i.is_visible)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_changes(&self) -> bool {
        self.items.iter().any(|i| i.has_changes)
    }

    pub(crate) fn mark_clean(&mut self) {
        self.items.iter_mut().for_each(MetadataItem::mark_clean);
    }

    /// Re-bind every item to another gallery object.
    pub(crate) fn bind_to(&mut self, media_object_id: i64) {
        for item in &mut self.items {
            item.set_media_object_id(media_object_id);
        }
    }
}
