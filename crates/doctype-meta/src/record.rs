//! Entity records
//!
//! A record is an open, ordered map from fieldname to JSON value. Its shape
//! is determined entirely by the doctype's descriptor list.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::descriptor::FieldDescriptor;

/// Keys the backend attaches to every record regardless of its descriptors
pub const SYSTEM_KEYS: &[&str] = &[
    "name",
    "id",
    "idx",
    "doctype",
    "parent",
    "parentfield",
    "parenttype",
    "owner",
    "creation",
    "modified",
    "modified_by",
    "docstatus",
];

/// Entity record: fieldname → value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, JsonValue>);

impl Record {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field
    #[inline]
    #[must_use]
    pub fn get(&self, fieldname: &str) -> Option<&JsonValue> {
        self.0.get(fieldname)
    }

    /// Mutable value of a field
    #[inline]
    pub fn get_mut(&mut self, fieldname: &str) -> Option<&mut JsonValue> {
        self.0.get_mut(fieldname)
    }

    /// String value of a field (numbers are not coerced)
    #[inline]
    #[must_use]
    pub fn get_str(&self, fieldname: &str) -> Option<&str> {
        self.0.get(fieldname).and_then(JsonValue::as_str)
    }

    /// Set a field, returning the previous value
    #[inline]
    pub fn insert(&mut self, fieldname: impl Into<String>, value: JsonValue) -> Option<JsonValue> {
        self.0.insert(fieldname.into(), value)
    }

    /// Builder-style set
    #[inline]
    #[must_use]
    pub fn with(mut self, fieldname: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(fieldname.into(), value.into());
        self
    }

    /// Remove a field, keeping the order of the others
    #[inline]
    pub fn remove(&mut self, fieldname: &str) -> Option<JsonValue> {
        self.0.shift_remove(fieldname)
    }

    /// Whether a field is present
    #[inline]
    #[must_use]
    pub fn contains(&self, fieldname: &str) -> bool {
        self.0.contains_key(fieldname)
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &JsonValue)> {
        self.0.iter()
    }

    /// Record identifier (`id`, falling back to `name`)
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
            .or_else(|| self.get_str("name"))
            .filter(|id| !id.is_empty())
    }

    /// Whether the field is absent or holds an empty value
    #[inline]
    #[must_use]
    pub fn is_blank(&self, fieldname: &str) -> bool {
        self.0.get(fieldname).map_or(true, is_empty_value)
    }

    /// Drop every key that has no descriptor; system keys are kept
    pub fn retain_known(&mut self, descriptors: &[FieldDescriptor]) {
        self.0.retain(|key, _| {
            SYSTEM_KEYS.contains(&key.as_str()) || descriptors.iter().any(|d| &d.fieldname == key)
        });
    }

    /// Overlay another record's fields onto this one
    pub fn merge(&mut self, other: &Record) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Convert into a JSON object
    #[must_use]
    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.0.into_iter().collect())
    }

    /// Build from a JSON value; non-objects yield `None`
    #[must_use]
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self(map.into_iter().collect())),
            _ => None,
        }
    }
}

impl FromIterator<(String, JsonValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, JsonValue);
    type IntoIter = indexmap::map::IntoIter<String, JsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Null, empty (or whitespace-only) string, or empty array
#[must_use]
pub fn is_empty_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::String(s) => s.trim().is_empty(),
        JsonValue::Array(items) => items.is_empty(),
        _ => false,
    }
}
