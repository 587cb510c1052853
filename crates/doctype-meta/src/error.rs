//! Error types for descriptor metadata

/// Metadata errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetaError {
    /// Two descriptors share a fieldname
    #[error("duplicate fieldname: {0}")]
    DuplicateField(String),

    /// Table field without child schema
    #[error("table field '{0}' has no sub_fields")]
    MissingSubFields(String),

    /// Filter operator outside `=`, `!=`, `in`
    #[error("unknown filter operator: {0}")]
    UnknownOperator(String),

    /// Filter expression could not be parsed
    #[error("invalid filter expression: {0}")]
    InvalidFilter(String),
}
