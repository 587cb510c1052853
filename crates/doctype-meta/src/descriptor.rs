//! Field descriptors
//!
//! Declarative description of one form field as returned by the backend's
//! `list_info` call. Descriptors are read-only reference data: the client
//! never mutates them, it only fetches them again.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::MetaError;
use crate::field_type::FieldType;

/// One `{label, value}` pair of a resolved option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionItem {
    /// Text shown to the user
    pub label: String,
    /// Stored identifier
    pub value: String,
}

impl OptionItem {
    /// Create option with distinct label and value
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// Create option whose label is its value
    #[inline]
    #[must_use]
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

impl<'de> Deserialize<'de> for OptionItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            label: Option<JsonValue>,
            value: JsonValue,
        }

        let raw = Raw::deserialize(deserializer)?;
        let value = scalar_text(&raw.value);
        // Backend sends a null label when the target doctype has no title field value
        let label = raw
            .label
            .as_ref()
            .map(scalar_text)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| value.clone());
        Ok(Self { label, value })
    }
}

/// Declarative description of one field of a doctype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique key within the owning doctype
    pub fieldname: String,

    /// Type tag
    pub fieldtype: FieldType,

    /// Human label
    #[serde(default)]
    pub label: Option<String>,

    /// Value must be non-empty
    #[serde(rename = "reqd", default, deserialize_with = "flag")]
    pub required: bool,

    /// Value is shown but cannot be edited
    #[serde(default, deserialize_with = "flag")]
    pub read_only: bool,

    /// Field is never shown
    #[serde(default, deserialize_with = "flag")]
    pub hidden: bool,

    /// Type-dependent options: newline-delimited choices (Select), target
    /// doctype (Link, Table), controlling field name (Dynamic Link)
    #[serde(default, deserialize_with = "options_text")]
    pub options: Option<String>,

    /// Resolved option list for Link / Table MultiSelect
    #[serde(default, deserialize_with = "null_as_default")]
    pub options_list: Vec<OptionItem>,

    /// Child schema (Table only)
    #[serde(default, deserialize_with = "null_as_default")]
    pub sub_fields: Vec<FieldDescriptor>,

    /// Help text
    #[serde(default)]
    pub description: Option<String>,

    /// Title field of the link target
    #[serde(default)]
    pub title_field: Option<String>,

    /// Default value declared by the backend
    #[serde(default)]
    pub default: Option<JsonValue>,

    /// Link control offers "create new linked record"
    #[serde(
        rename = "isAddNew",
        default = "default_true",
        deserialize_with = "allow_create_flag",
        serialize_with = "serialize_allow_create"
    )]
    pub allow_create: bool,
}

impl FieldDescriptor {
    /// Create descriptor with the given name and type
    #[must_use]
    pub fn new(fieldname: impl Into<String>, fieldtype: FieldType) -> Self {
        Self {
            fieldname: fieldname.into(),
            fieldtype,
            label: None,
            required: false,
            read_only: false,
            hidden: false,
            options: None,
            options_list: Vec::new(),
            sub_fields: Vec::new(),
            description: None,
            title_field: None,
            default: None,
            allow_create: true,
        }
    }

    /// With label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Mark required
    #[inline]
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark read-only
    #[inline]
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Mark hidden
    #[inline]
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// With raw options string
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// With resolved option list
    #[inline]
    #[must_use]
    pub fn with_options_list(mut self, options: Vec<OptionItem>) -> Self {
        self.options_list = options;
        self
    }

    /// With child schema
    #[inline]
    #[must_use]
    pub fn with_sub_fields(mut self, sub_fields: Vec<FieldDescriptor>) -> Self {
        self.sub_fields = sub_fields;
        self
    }

    /// With help text
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// With backend default
    #[inline]
    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Disable "create new linked record"
    #[inline]
    #[must_use]
    pub fn without_create(mut self) -> Self {
        self.allow_create = false;
        self
    }

    /// Label, falling back to the fieldname
    #[inline]
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.fieldname)
    }

    /// Choices of a Select field, in declaration order
    #[must_use]
    pub fn select_options(&self) -> Vec<OptionItem> {
        self.options
            .as_deref()
            .map(|raw| {
                raw.split('\n')
                    .map(|line| line.trim_end_matches('\r'))
                    .filter(|line| !line.is_empty())
                    .map(OptionItem::plain)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Options a choice control offers: newline split for Select, the
    /// resolved list otherwise
    #[must_use]
    pub fn choices(&self) -> Vec<OptionItem> {
        match self.fieldtype {
            FieldType::Select => self.select_options(),
            _ => self.options_list.clone(),
        }
    }

    /// Target doctype of a Link / Table field
    #[inline]
    #[must_use]
    pub fn link_target(&self) -> Option<&str> {
        match self.fieldtype {
            FieldType::Link | FieldType::Table | FieldType::TableMultiSelect => {
                self.options.as_deref().filter(|o| !o.is_empty())
            }
            _ => None,
        }
    }

    /// Field holding the target doctype of a Dynamic Link
    #[inline]
    #[must_use]
    pub fn dynamic_link_source(&self) -> Option<&str> {
        match self.fieldtype {
            FieldType::DynamicLink => self.options.as_deref().filter(|o| !o.is_empty()),
            _ => None,
        }
    }

    /// Sub-field names forming the composite row key of a Table field
    #[must_use]
    pub fn key_fields(&self) -> Vec<&str> {
        self.sub_fields
            .iter()
            .filter(|f| !f.fieldtype.is_structural())
            .map(|f| f.fieldname.as_str())
            .collect()
    }

    /// Sub-field by name
    #[must_use]
    pub fn sub_field(&self, fieldname: &str) -> Option<&FieldDescriptor> {
        self.sub_fields.iter().find(|f| f.fieldname == fieldname)
    }
}

/// Descriptor list of one doctype, as returned by `list_info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoctypeInfo {
    /// Field descriptors in backend order
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDescriptor>,

    /// Layout order of all fieldnames
    #[serde(default, deserialize_with = "null_as_default")]
    pub field_order: Vec<String>,

    /// Doctype supports submit/cancel
    #[serde(default, deserialize_with = "flag")]
    pub is_submittable: bool,
}

impl DoctypeInfo {
    /// Create from descriptors
    #[must_use]
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        let field_order = fields.iter().map(|f| f.fieldname.clone()).collect();
        Self {
            fields,
            field_order,
            is_submittable: false,
        }
    }

    /// Descriptor by fieldname
    #[inline]
    #[must_use]
    pub fn field(&self, fieldname: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.fieldname == fieldname)
    }

    /// Check whether a fieldname is described
    #[inline]
    #[must_use]
    pub fn contains(&self, fieldname: &str) -> bool {
        self.field(fieldname).is_some()
    }

    /// Names of every described field
    #[must_use]
    pub fn fieldnames(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.fieldname.as_str()).collect()
    }

    /// Check descriptor invariants
    ///
    /// # Errors
    /// - `MetaError::DuplicateField` if two descriptors share a fieldname
    /// - `MetaError::MissingSubFields` if a Table field has no child schema
    pub fn validate(&self) -> Result<(), MetaError> {
        validate_descriptors(&self.fields)
    }
}

/// Check uniqueness of fieldnames and Table child schemas, recursively
///
/// # Errors
/// See [`DoctypeInfo::validate`].
pub fn validate_descriptors(fields: &[FieldDescriptor]) -> Result<(), MetaError> {
    let mut seen = HashSet::with_capacity(fields.len());
    for field in fields {
        if !seen.insert(field.fieldname.as_str()) {
            return Err(MetaError::DuplicateField(field.fieldname.clone()));
        }
        if field.fieldtype == FieldType::Table {
            if field.sub_fields.is_empty() {
                return Err(MetaError::MissingSubFields(field.fieldname.clone()));
            }
            validate_descriptors(&field.sub_fields)?;
        }
    }
    Ok(())
}

fn scalar_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn default_true() -> bool {
    true
}

/// Backend flags arrive as `0/1`, booleans, numeric strings or null
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => b,
        Some(JsonValue::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(JsonValue::String(s)) => matches!(s.trim(), "1" | "true" | "True" | "yes"),
        Some(_) => false,
    })
}

fn allow_create_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => s != "no",
        Some(JsonValue::Bool(b)) => b,
        _ => true,
    })
}

fn serialize_allow_create<S: Serializer>(allow: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *allow { "yes" } else { "no" })
}

/// Options arrive as a string, a list of strings, or null
fn options_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Array(items)) => Some(
            items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Some(other) => Some(other.to_string()),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_backend_payload() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "fieldname": "plot_status",
            "fieldtype": "Select",
            "label": "Plot Status",
            "reqd": 1,
            "read_only": 0,
            "options": "New\nBooked\nSold",
            "options_list": null,
        }))
        .unwrap();

        assert!(field.required);
        assert!(!field.read_only);
        assert!(field.allow_create);
        assert_eq!(
            field.select_options(),
            vec![
                OptionItem::plain("New"),
                OptionItem::plain("Booked"),
                OptionItem::plain("Sold"),
            ]
        );
    }

    #[test]
    fn decodes_sparse_sub_fields() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "fieldname": "all_document",
            "fieldtype": "Table",
            "options": "Legal Document",
            "sub_fields": [
                {"fieldname": "document_type", "fieldtype": "Link", "options": "Document Type"},
                {"fieldname": "section", "fieldtype": "Section Break", "options": null},
                {"fieldname": "file", "fieldtype": "Attach", "options": null}
            ]
        }))
        .unwrap();

        assert_eq!(field.link_target(), Some("Legal Document"));
        assert_eq!(field.key_fields(), vec!["document_type", "file"]);
        assert!(field.sub_field("file").is_some());
    }

    #[test]
    fn option_item_label_falls_back_to_value() {
        let items: Vec<OptionItem> = serde_json::from_value(json!([
            {"label": null, "value": "CUST-0001"},
            {"label": "Asha", "value": "CUST-0002"}
        ]))
        .unwrap();
        assert_eq!(items[0].label, "CUST-0001");
        assert_eq!(items[1].label, "Asha");
    }

    #[test]
    fn is_add_new_no_disables_create() {
        let field: FieldDescriptor = serde_json::from_value(json!({
            "fieldname": "customer",
            "fieldtype": "Link",
            "isAddNew": "no"
        }))
        .unwrap();
        assert!(!field.allow_create);
    }

    #[test]
    fn display_label_falls_back_to_fieldname() {
        let field = FieldDescriptor::new("plot_no", FieldType::Data);
        assert_eq!(field.display_label(), "plot_no");
        let labelled = field.with_label("Plot No");
        assert_eq!(labelled.display_label(), "Plot No");
    }

    #[test]
    fn validate_rejects_duplicates() {
        let info = DoctypeInfo::new(vec![
            FieldDescriptor::new("a", FieldType::Data),
            FieldDescriptor::new("a", FieldType::Int),
        ]);
        assert!(matches!(info.validate(), Err(MetaError::DuplicateField(name)) if name == "a"));
    }

    #[test]
    fn validate_requires_table_sub_fields() {
        let info = DoctypeInfo::new(vec![FieldDescriptor::new("rows", FieldType::Table)]);
        assert!(matches!(info.validate(), Err(MetaError::MissingSubFields(_))));

        let ok = DoctypeInfo::new(vec![FieldDescriptor::new("rows", FieldType::Table)
            .with_sub_fields(vec![FieldDescriptor::new("x", FieldType::Data)])]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn dynamic_link_source_only_for_dynamic_links() {
        let dl = FieldDescriptor::new("party", FieldType::DynamicLink).with_options("party_type");
        assert_eq!(dl.dynamic_link_source(), Some("party_type"));
        assert_eq!(dl.link_target(), None);
    }
}
