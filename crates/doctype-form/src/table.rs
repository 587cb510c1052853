//! Sub-table editor
//!
//! Owns the rows of one Table field. Rows are edited through nested forms
//! over the field's `sub_fields`, identified by array index. Adding a row
//! whose key fields match an existing row replaces that row in place.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use doctype_meta::{FieldDescriptor, FieldType, Record};

use crate::error::TableError;
use crate::form::{DynamicForm, FormOptions};
use crate::format::{self, NumberFormat};
use crate::render::{ControlEvent, FieldRenderer, RenderedField};
use crate::richtext;
use crate::schema::{SchemaBuilder, ValidationSchema};
use crate::state::FormState;

/// Row attribute tracking insertion order
pub const IDX_KEY: &str = "idx";

const KEY_SEPARATOR: char = '\u{1f}';

/// Column of a table view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableColumn {
    /// Sub-field key
    pub fieldname: String,
    /// Header text
    pub label: String,
}

/// Tabular view of sub-table rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableView {
    /// Headers
    pub columns: Vec<TableColumn>,
    /// Display text, one vector per row
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    /// Build a view from a raw Table value
    #[must_use]
    pub fn build(field: &FieldDescriptor, value: &JsonValue, columns: Option<&[&str]>) -> Self {
        Self::from_rows(field, &rows_from_value(value), columns)
    }

    /// Build a view from rows; `None` shows every visible sub-field
    #[must_use]
    pub fn from_rows(field: &FieldDescriptor, rows: &[Record], columns: Option<&[&str]>) -> Self {
        let subs: Vec<&FieldDescriptor> = match columns {
            Some(names) => names.iter().filter_map(|n| field.sub_field(n)).collect(),
            None => field
                .sub_fields
                .iter()
                .filter(|f| !f.hidden && !f.fieldtype.is_structural())
                .collect(),
        };
        Self {
            columns: subs
                .iter()
                .map(|f| TableColumn {
                    fieldname: f.fieldname.clone(),
                    label: f.display_label().to_string(),
                })
                .collect(),
            rows: rows
                .iter()
                .map(|row| {
                    subs.iter()
                        .map(|f| cell_text(f, row.get(&f.fieldname).unwrap_or(&JsonValue::Null)))
                        .collect()
                })
                .collect(),
        }
    }
}

fn cell_text(field: &FieldDescriptor, value: &JsonValue) -> String {
    match field.fieldtype {
        FieldType::Link | FieldType::DynamicLink => {
            let raw = format::value_text(value);
            field
                .options_list
                .iter()
                .find(|o| o.value == raw)
                .map_or(raw, |o| o.label.clone())
        }
        FieldType::Check => (if format::is_checked(value) { "Yes" } else { "No" }).to_string(),
        FieldType::Int => NumberFormat::INT.display(value),
        FieldType::Float => NumberFormat::FLOAT.display(value),
        FieldType::TextEditor | FieldType::Html => richtext::strip_tags(&richtext::to_html(value)),
        _ => format::value_text(value),
    }
}

fn rows_from_value(value: &JsonValue) -> Vec<Record> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| {
                let row = Record::from_json(item.clone());
                if row.is_none() {
                    tracing::warn!(?item, "skipping non-object table row");
                }
                row
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn idx_of(row: &Record) -> Option<u64> {
    row.get(IDX_KEY).and_then(|v| match v {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    })
}

/// Whether a row editor adds or edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowMode {
    /// New row, appended on confirm
    Add,
    /// Existing row at the index captured when the editor opened
    Edit(usize),
}

/// Nested editing session for one row
#[derive(Debug, Clone)]
pub struct RowEditor {
    mode: RowMode,
    snapshot: Option<Record>,
    state: FormState,
    fieldnames: Vec<String>,
}

impl RowEditor {
    /// Add or edit
    #[inline]
    #[must_use]
    pub fn mode(&self) -> RowMode {
        self.mode
    }

    /// Row values being edited
    #[inline]
    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Mutable row values
    #[inline]
    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.state
    }

    /// Set one sub-field
    pub fn set(&mut self, fieldname: &str, value: JsonValue) {
        self.state.set(fieldname, value);
    }

    /// Apply a control event to one sub-field
    ///
    /// # Errors
    /// See [`FormState::apply_event`].
    pub fn apply_event(
        &mut self,
        renderer: &FieldRenderer,
        fieldname: &str,
        event: ControlEvent,
    ) -> crate::error::Result<()> {
        self.state.apply_event(renderer, fieldname, event)
    }

    /// Render the nested form
    #[must_use]
    pub fn render(&self, renderer: &FieldRenderer) -> Vec<RenderedField> {
        DynamicForm::new(renderer.clone(), FormOptions::default()).render(
            Some(self.state.descriptors()),
            Some(self.fieldnames.as_slice()),
            &self.state,
        )
    }
}

/// Pending row deletion awaiting confirmation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDelete {
    index: usize,
    snapshot: Record,
}

impl PendingDelete {
    /// Index of the row to delete
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Row to delete
    #[inline]
    #[must_use]
    pub fn row(&self) -> &Record {
        &self.snapshot
    }
}

/// Editor over the rows of one Table field
#[derive(Debug, Clone)]
pub struct SubTableEditor {
    field: FieldDescriptor,
    rows: Vec<Record>,
    key_fields: Vec<String>,
    editable: Vec<FieldDescriptor>,
    schema: ValidationSchema,
}

impl SubTableEditor {
    /// Create an empty editor for a Table field
    ///
    /// # Errors
    /// `TableError::NotATable` if the field is not a Table with sub_fields
    pub fn new(field: FieldDescriptor) -> Result<Self, TableError> {
        if field.fieldtype != FieldType::Table || field.sub_fields.is_empty() {
            return Err(TableError::NotATable(field.fieldname));
        }
        // Nested forms edit only what the user can fill in
        let editable: Vec<FieldDescriptor> = field
            .sub_fields
            .iter()
            .filter(|f| !f.hidden && !f.read_only && !f.fieldtype.is_structural())
            .cloned()
            .collect();
        let schema = SchemaBuilder::new().build(Some(editable.as_slice()));
        let key_fields = field.key_fields().into_iter().map(str::to_string).collect();
        Ok(Self {
            field,
            rows: Vec::new(),
            key_fields,
            editable,
            schema,
        })
    }

    /// Create an editor over the rows held in a Table value
    ///
    /// # Errors
    /// See [`SubTableEditor::new`].
    pub fn from_value(field: FieldDescriptor, value: &JsonValue) -> Result<Self, TableError> {
        let mut editor = Self::new(field)?;
        for mut row in rows_from_value(value) {
            if idx_of(&row).is_none() {
                row.insert(IDX_KEY, JsonValue::from(editor.next_idx()));
            }
            editor.rows.push(row);
        }
        Ok(editor)
    }

    /// Override the composite key used for de-duplication
    #[must_use]
    pub fn with_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Table fieldname
    #[inline]
    #[must_use]
    pub fn fieldname(&self) -> &str {
        &self.field.fieldname
    }

    /// Rows in display order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// No rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Key fields of the composite row key
    #[inline]
    #[must_use]
    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// Rows as a Table value
    #[must_use]
    pub fn to_value(&self) -> JsonValue {
        JsonValue::Array(self.rows.iter().cloned().map(Record::into_json).collect())
    }

    /// Open a nested editor for a new row
    #[must_use]
    pub fn open_add(&self) -> RowEditor {
        RowEditor {
            mode: RowMode::Add,
            snapshot: None,
            state: FormState::new(&self.editable),
            fieldnames: self.editable_names(),
        }
    }

    /// Open a nested editor pre-filled with the row at `index`
    ///
    /// # Errors
    /// `TableError::StaleIndex` if there is no such row
    pub fn open_edit(&self, index: usize) -> Result<RowEditor, TableError> {
        let row = self.row_at(index)?;
        Ok(RowEditor {
            mode: RowMode::Edit(index),
            snapshot: Some(row.clone()),
            state: FormState::from_record(&self.editable, row),
            fieldnames: self.editable_names(),
        })
    }

    /// Confirm a nested editor, returning the index of the stored row
    ///
    /// On validation failure the editor keeps the errors for display.
    ///
    /// # Errors
    /// - `TableError::InvalidRow` if the row fails the child schema
    /// - `TableError::StaleIndex` if the edited row moved or disappeared
    pub fn confirm(&mut self, editor: &mut RowEditor) -> Result<usize, TableError> {
        if !editor.state.validate(&self.schema) {
            return Err(TableError::InvalidRow(editor.state.report().clone()));
        }
        let mut row = editor.state.values().clone();

        match editor.mode {
            RowMode::Add => {
                row.insert(IDX_KEY, JsonValue::from(self.next_idx()));
                let key = self.row_key(&row);
                self.rows.push(row);
                self.dedup();
                let appended = self.rows.len() - 1;
                let index = match key {
                    Some(key) => self
                        .rows
                        .iter()
                        .position(|r| self.row_key(r).as_ref() == Some(&key))
                        .unwrap_or(appended),
                    None => appended,
                };
                tracing::debug!(table = %self.field.fieldname, index, rows = self.rows.len(), "row added");
                Ok(index)
            }
            RowMode::Edit(index) => {
                self.check_snapshot(index, editor.snapshot.as_ref())?;
                if let Some(idx) = self.rows[index].get(IDX_KEY).cloned() {
                    row.insert(IDX_KEY, idx);
                }
                self.rows[index] = row;
                tracing::debug!(table = %self.field.fieldname, index, "row updated");
                Ok(index)
            }
        }
    }

    /// Ask to delete the row at `index`; nothing changes until confirmed
    ///
    /// # Errors
    /// `TableError::StaleIndex` if there is no such row
    pub fn request_delete(&self, index: usize) -> Result<PendingDelete, TableError> {
        Ok(PendingDelete {
            index,
            snapshot: self.row_at(index)?.clone(),
        })
    }

    /// Delete a row after confirmation
    ///
    /// # Errors
    /// `TableError::StaleIndex` if the row moved or disappeared
    pub fn confirm_delete(&mut self, pending: PendingDelete) -> Result<Record, TableError> {
        self.check_snapshot(pending.index, Some(&pending.snapshot))?;
        tracing::debug!(table = %self.field.fieldname, index = pending.index, "row deleted");
        Ok(self.rows.remove(pending.index))
    }

    /// Tabular view; `None` shows every visible sub-field
    #[must_use]
    pub fn view(&self, columns: Option<&[&str]>) -> TableView {
        TableView::from_rows(&self.field, &self.rows, columns)
    }

    fn editable_names(&self) -> Vec<String> {
        self.editable.iter().map(|f| f.fieldname.clone()).collect()
    }

    fn row_at(&self, index: usize) -> Result<&Record, TableError> {
        self.rows.get(index).ok_or(TableError::StaleIndex {
            index,
            len: self.rows.len(),
        })
    }

    fn check_snapshot(&self, index: usize, snapshot: Option<&Record>) -> Result<(), TableError> {
        let current = self.row_at(index)?;
        if snapshot.is_some_and(|s| s != current) {
            return Err(TableError::StaleIndex {
                index,
                len: self.rows.len(),
            });
        }
        Ok(())
    }

    fn next_idx(&self) -> u64 {
        self.rows.iter().filter_map(idx_of).max().unwrap_or(0) + 1
    }

    fn row_key(&self, row: &Record) -> Option<String> {
        if self.key_fields.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .key_fields
            .iter()
            .map(|k| format::value_text(row.get(k).unwrap_or(&JsonValue::Null)))
            .collect();
        Some(parts.join(&KEY_SEPARATOR.to_string()))
    }

    /// Collapse rows sharing a key: the first position is kept, the last
    /// occurrence's values win, the first occurrence's `idx` is kept
    fn dedup(&mut self) {
        if self.key_fields.is_empty() {
            return;
        }
        let mut by_key: IndexMap<String, Record> = IndexMap::with_capacity(self.rows.len());
        for row in std::mem::take(&mut self.rows) {
            let key = self.row_key(&row).unwrap_or_default();
            match by_key.get_mut(&key) {
                Some(existing) => {
                    let idx = existing.get(IDX_KEY).cloned();
                    *existing = row;
                    if let Some(idx) = idx {
                        existing.insert(IDX_KEY, idx);
                    }
                }
                None => {
                    by_key.insert(key, row);
                }
            }
        }
        self.rows = by_key.into_values().collect();
    }
}
