//! Business rules that override fetched metadata
//!
//! These rules are applied by the form layer on top of what the backend
//! declares. They never mutate the fetched descriptors.

/// Fields that are always required, whatever the backend declares
///
/// A lead without a last name cannot be matched to a customer, so the form
/// insists on it even where the doctype leaves it optional.
pub const ALWAYS_REQUIRED_FIELDS: &[&str] = &["last_name"];

/// Whether a field is forced required by a business rule
#[inline]
#[must_use]
pub fn is_forced_required(fieldname: &str) -> bool {
    ALWAYS_REQUIRED_FIELDS.contains(&fieldname)
}
