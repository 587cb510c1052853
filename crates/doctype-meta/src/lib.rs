//! Doctype metadata
//!
//! The declarative side of a doctype backend:
//! - **FieldType** / **FieldDescriptor**: what a field is and how it is described
//! - **DoctypeInfo**: the descriptor list of one doctype
//! - **Record**: an open fieldname → value map shaped by the descriptors
//! - **Filter** / **ListQuery**: paginated, filtered list requests
//!
//! # Example
//!
//! ```rust
//! use doctype_meta::{DoctypeInfo, FieldDescriptor, FieldType};
//!
//! let info = DoctypeInfo::new(vec![
//!     FieldDescriptor::new("plot_no", FieldType::Data).required(),
//!     FieldDescriptor::new("plot_status", FieldType::Select).with_options("New\nBooked\nSold"),
//! ]);
//!
//! assert!(info.validate().is_ok());
//! assert_eq!(info.field("plot_status").unwrap().select_options().len(), 3);
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod field_type;
pub mod query;
pub mod record;
pub mod rules;

// Re-exports
pub use descriptor::{validate_descriptors, DoctypeInfo, FieldDescriptor, OptionItem};
pub use error::MetaError;
pub use field_type::FieldType;
pub use query::{Filter, FilterOp, ListPage, ListQuery, DEFAULT_ORDER_BY, DEFAULT_PAGE_LENGTH};
pub use record::{is_empty_value, Record, SYSTEM_KEYS};
pub use rules::{is_forced_required, ALWAYS_REQUIRED_FIELDS};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with doctype metadata
    pub use crate::{
        DoctypeInfo, FieldDescriptor, FieldType, Filter, FilterOp, ListPage, ListQuery, OptionItem,
        Record,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
