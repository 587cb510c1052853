//! Form state
//!
//! Transient values and validation errors of one form instance. Created from
//! descriptor defaults or a fetched record, mutated on every edit, reset or
//! dropped when the form closes.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use doctype_meta::{FieldDescriptor, FieldType, OptionItem, Record};

use crate::error::{FormError, Result};
use crate::format;
use crate::render::{empty_value, ControlEvent, FieldRenderer};
use crate::schema::{ValidationReport, ValidationSchema};
use crate::table::SubTableEditor;

static NULL: JsonValue = JsonValue::Null;

/// Resolved target of one Dynamic Link field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkResolution {
    /// Field whose value names the target doctype
    pub source_field: String,
    /// Target doctype, once the source field has a value
    pub doctype: Option<String>,
    /// Options of the target doctype
    pub options: Vec<OptionItem>,
    /// Options belong to an earlier target and must be re-resolved
    pub stale: bool,
}

/// Values, errors and dirty flag of one form
#[derive(Debug, Clone)]
pub struct FormState {
    descriptors: Vec<FieldDescriptor>,
    values: Record,
    initial: Record,
    report: ValidationReport,
    dirty: bool,
    links: IndexMap<String, LinkResolution>,
}

impl FormState {
    /// Create state from descriptor defaults
    #[must_use]
    pub fn new(descriptors: &[FieldDescriptor]) -> Self {
        let mut values = Record::new();
        for field in descriptors.iter().filter(|f| !f.fieldtype.is_structural()) {
            let value = field
                .default
                .clone()
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| empty_value(&field.fieldtype));
            values.insert(field.fieldname.clone(), value);
        }
        Self::with_values(descriptors, values)
    }

    /// Create state populated from a fetched record
    #[must_use]
    pub fn from_record(descriptors: &[FieldDescriptor], record: &Record) -> Self {
        let mut state = Self::new(descriptors);
        state.values.merge(record);
        state.initial = state.values.clone();
        state.sync_links();
        state
    }

    fn with_values(descriptors: &[FieldDescriptor], values: Record) -> Self {
        let links = descriptors
            .iter()
            .filter_map(|f| {
                f.dynamic_link_source().map(|source| {
                    (
                        f.fieldname.clone(),
                        LinkResolution {
                            source_field: source.to_string(),
                            ..LinkResolution::default()
                        },
                    )
                })
            })
            .collect();
        let mut state = Self {
            descriptors: descriptors.to_vec(),
            initial: values.clone(),
            values,
            report: ValidationReport::default(),
            dirty: false,
            links,
        };
        state.sync_links();
        state
    }

    /// Descriptors this form was built from
    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &[FieldDescriptor] {
        &self.descriptors
    }

    /// Descriptor by fieldname
    #[inline]
    #[must_use]
    pub fn descriptor(&self, fieldname: &str) -> Option<&FieldDescriptor> {
        self.descriptors.iter().find(|f| f.fieldname == fieldname)
    }

    /// Current values
    #[inline]
    #[must_use]
    pub fn values(&self) -> &Record {
        &self.values
    }

    /// Current value of a field (`null` when absent)
    #[inline]
    #[must_use]
    pub fn value(&self, fieldname: &str) -> &JsonValue {
        self.values.get(fieldname).unwrap_or(&NULL)
    }

    /// Current validation error of a field
    #[inline]
    #[must_use]
    pub fn error(&self, fieldname: &str) -> Option<&str> {
        self.report.error(fieldname)
    }

    /// Last validation report
    #[inline]
    #[must_use]
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Edited since creation or last reset
    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set a field value; clears that field's error
    pub fn set(&mut self, fieldname: &str, value: JsonValue) {
        self.report.errors.shift_remove(fieldname);
        self.report.warnings.shift_remove(fieldname);
        self.values.insert(fieldname, value);
        self.dirty = true;
        if self.links.values().any(|l| l.source_field == fieldname) {
            self.retarget_links(fieldname);
        }
    }

    /// Apply a control event through the renderer
    ///
    /// # Errors
    /// - `FormError::UnknownField` if no descriptor has this fieldname
    /// - `FormError::Input` if the event does not produce a value
    pub fn apply_event(&mut self, renderer: &FieldRenderer, fieldname: &str, event: ControlEvent) -> Result<()> {
        let descriptor = self
            .descriptor(fieldname)
            .ok_or_else(|| FormError::UnknownField(fieldname.to_string()))?;
        let value = renderer.apply(descriptor, self.value(fieldname), event)?;
        self.set(fieldname, value);
        Ok(())
    }

    /// Validate all values, keeping the report for display
    pub fn validate(&mut self, schema: &ValidationSchema) -> bool {
        self.report = schema.validate(&self.values);
        self.report.is_valid()
    }

    /// Validate and return the record to send, or the report blocking it
    ///
    /// Keys without a descriptor are dropped (system keys are kept).
    ///
    /// # Errors
    /// The validation report when any field has an error.
    pub fn submit(&mut self, schema: &ValidationSchema) -> std::result::Result<Record, ValidationReport> {
        if !self.validate(schema) {
            return Err(self.report.clone());
        }
        let mut record = self.values.clone();
        record.retain_known(&self.descriptors);
        Ok(record)
    }

    /// Restore the values the form was created with
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.report = ValidationReport::default();
        self.dirty = false;
        self.sync_links();
    }

    /// Make the current values the new baseline (after a successful save)
    pub fn mark_saved(&mut self, record: &Record) {
        self.values.merge(record);
        self.initial = self.values.clone();
        self.dirty = false;
    }

    /// Swap in freshly fetched descriptors, keeping values
    pub fn refresh_descriptors(&mut self, descriptors: &[FieldDescriptor]) {
        for field in descriptors.iter().filter(|f| !f.fieldtype.is_structural()) {
            if !self.values.contains(&field.fieldname) {
                self.values.insert(field.fieldname.clone(), empty_value(&field.fieldtype));
            }
        }
        self.descriptors = descriptors.to_vec();
        let previous = std::mem::take(&mut self.links);
        for field in &self.descriptors {
            if let Some(source) = field.dynamic_link_source() {
                let link = previous.get(&field.fieldname).cloned().unwrap_or_else(|| LinkResolution {
                    source_field: source.to_string(),
                    ..LinkResolution::default()
                });
                self.links.insert(field.fieldname.clone(), link);
            }
        }
        self.sync_links();
    }

    /// Resolution of a Dynamic Link field
    #[inline]
    #[must_use]
    pub fn link(&self, fieldname: &str) -> Option<&LinkResolution> {
        self.links.get(fieldname)
    }

    /// Dynamic Links whose options must be (re-)resolved: `(fieldname, doctype)`
    #[must_use]
    pub fn stale_links(&self) -> Vec<(String, String)> {
        self.links
            .iter()
            .filter(|(_, l)| l.stale)
            .filter_map(|(name, l)| l.doctype.clone().map(|doctype| (name.clone(), doctype)))
            .collect()
    }

    /// Store resolved options for a Dynamic Link
    pub fn resolve_link(&mut self, fieldname: &str, options: Vec<OptionItem>) {
        if let Some(link) = self.links.get_mut(fieldname) {
            link.options = options;
            link.stale = false;
        }
    }

    /// Open a sub-table editor over a Table field's current rows
    ///
    /// # Errors
    /// - `FormError::UnknownField` if no descriptor has this fieldname
    /// - `FormError::Table` if the field is not a Table with sub_fields
    pub fn open_table(&self, fieldname: &str) -> Result<SubTableEditor> {
        let descriptor = self
            .descriptor(fieldname)
            .ok_or_else(|| FormError::UnknownField(fieldname.to_string()))?;
        Ok(SubTableEditor::from_value(descriptor.clone(), self.value(fieldname))?)
    }

    /// Write an editor's rows back into the Table field
    pub fn commit_table(&mut self, editor: &SubTableEditor) {
        self.set(editor.fieldname(), editor.to_value());
    }

    /// Align link targets with the current source values without marking edits
    fn sync_links(&mut self) {
        let sources: Vec<(String, Option<String>)> = self
            .links
            .iter()
            .map(|(name, l)| (name.clone(), non_empty_text(self.value(&l.source_field))))
            .collect();
        for (name, doctype) in sources {
            if let Some(link) = self.links.get_mut(&name) {
                if link.doctype != doctype {
                    link.doctype = doctype;
                    link.options.clear();
                    link.stale = link.doctype.is_some();
                }
            }
        }
    }

    /// Source field changed: dependent links point at a new doctype
    fn retarget_links(&mut self, source: &str) {
        let doctype = non_empty_text(self.value(source));
        let mut cleared = Vec::new();
        for (name, link) in self.links.iter_mut().filter(|(_, l)| l.source_field == source) {
            if link.doctype != doctype {
                link.doctype = doctype.clone();
                link.options.clear();
                link.stale = link.doctype.is_some();
                cleared.push(name.clone());
            }
        }
        // A value chosen for the previous target is meaningless now
        for name in cleared {
            self.values
                .insert(name, empty_value(&FieldType::DynamicLink));
        }
    }
}

fn non_empty_text(value: &JsonValue) -> Option<String> {
    Some(format::value_text(value)).filter(|s| !s.trim().is_empty())
}
