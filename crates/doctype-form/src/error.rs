//! Error types for the form engine

use crate::schema::ValidationReport;

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Form-level errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum FormError {
    /// Fieldname has no descriptor in this form
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Control event could not be turned into a value
    #[error(transparent)]
    Input(#[from] InputError),

    /// Sub-table operation failed
    #[error(transparent)]
    Table(#[from] TableError),
}

/// A control event that does not produce a storable value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Typed text is not a number
    #[error("{field}: '{input}' is not a number")]
    NotANumber {
        /// Field receiving the input
        field: String,
        /// Offending text
        input: String,
    },

    /// Typed number cannot be stored
    #[error("{field}: '{input}' is out of range")]
    OutOfRange {
        /// Field receiving the input
        field: String,
        /// Offending text
        input: String,
    },

    /// Typed text is not a date/time in an accepted format
    #[error("{field}: '{input}' is not a valid {fieldtype} value")]
    InvalidTemporal {
        /// Field receiving the input
        field: String,
        /// Date, Time or Datetime
        fieldtype: String,
        /// Offending text
        input: String,
    },

    /// Color is not a hex string
    #[error("{field}: '{input}' is not a hex color")]
    InvalidColor {
        /// Field receiving the input
        field: String,
        /// Offending text
        input: String,
    },

    /// Field cannot be edited
    #[error("{0} is read-only")]
    ReadOnly(String),

    /// Event kind does not apply to this field type
    #[error("{event} event does not apply to {fieldtype} field {field}")]
    Mismatch {
        /// Field receiving the event
        field: String,
        /// Field type tag
        fieldtype: String,
        /// Event kind
        event: &'static str,
    },
}

/// Sub-table editing errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    /// Field is not a Table with a child schema
    #[error("{0} is not a table field with sub_fields")]
    NotATable(String),

    /// Row index captured by an editor no longer designates the same row
    #[error("row {index} is stale (table has {len} rows)")]
    StaleIndex {
        /// Index captured when the editor was opened
        index: usize,
        /// Current row count
        len: usize,
    },

    /// Row failed validation against the child schema
    #[error("row is invalid: {0}")]
    InvalidRow(ValidationReport),
}
