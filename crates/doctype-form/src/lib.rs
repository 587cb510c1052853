//! Metadata-driven form engine
//!
//! Headless rendition of a doctype form. Everything is derived from the
//! field descriptors fetched at runtime:
//!
//! 1. **SchemaBuilder**: descriptors → per-field validation rules
//! 2. **FieldRenderer**: descriptor + value → control blueprint, control event → value
//! 3. **SubTableEditor**: add/edit/delete rows of a Table field through nested forms
//! 4. **DynamicForm**: requested fieldnames → stack of rendered fields
//! 5. **FormState**: values, errors and dirty flag of one form instance
//!
//! # Example
//!
//! ```rust
//! use doctype_form::prelude::*;
//! use doctype_meta::{FieldDescriptor, FieldType};
//! use serde_json::json;
//!
//! let fields = vec![
//!     FieldDescriptor::new("plot_no", FieldType::Data).with_label("Plot No").required(),
//!     FieldDescriptor::new("plot_status", FieldType::Select).with_options("New\nBooked\nSold"),
//! ];
//!
//! let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
//! let mut state = FormState::new(&fields);
//! state.set("plot_status", json!("Booked"));
//!
//! let report = state.submit(&schema).unwrap_err();
//! assert_eq!(report.error("plot_no"), Some("Plot No is required"));
//!
//! let rendered = DynamicForm::default().render_all(&fields, &state);
//! assert_eq!(rendered.len(), 2);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod form;
pub mod format;
pub mod render;
pub mod richtext;
pub mod schema;
pub mod state;
pub mod table;

// Re-exports
pub use error::{FormError, InputError, Result, TableError};
pub use form::{DynamicForm, FormOptions};
pub use format::{DateMode, NumberFormat, ParseNumberError};
pub use render::{Binding, Control, ControlEvent, FieldRenderer, RenderOptions, RenderedField};
pub use schema::{
    FieldCheck, FieldRule, OptionPolicy, SchemaBuilder, SchemaOptions, TableRequiredPolicy, TypeRule,
    ValidationReport, ValidationSchema,
};
pub use state::{FormState, LinkResolution};
pub use table::{PendingDelete, RowEditor, RowMode, SubTableEditor, TableColumn, TableView};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and rendering forms
    pub use crate::{
        Control, ControlEvent, DynamicForm, FieldRenderer, FormOptions, FormState, RenderOptions,
        RenderedField, SchemaBuilder, SchemaOptions, SubTableEditor, ValidationReport, ValidationSchema,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
