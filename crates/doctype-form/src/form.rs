//! Dynamic form
//!
//! Renders a requested, ordered subset of a doctype's fields. Missing or
//! still-loading metadata renders nothing rather than failing.

use std::collections::{HashMap, HashSet};

use doctype_meta::{is_forced_required, FieldDescriptor};

use crate::render::{Binding, FieldRenderer, RenderedField};
use crate::state::FormState;

/// Per-call rendering options
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    /// Every field is read-only
    pub read_only: bool,
    /// Fields forced read-only
    pub read_only_fields: HashSet<String>,
    /// Fields never rendered
    pub skip: HashSet<String>,
    /// Fields owned by another widget (`true` hides)
    pub ignore: HashMap<String, bool>,
    /// Fields shown as required although the backend does not mark them
    pub extra_required: HashSet<String>,
}

impl FormOptions {
    /// Make the whole form read-only
    #[inline]
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Force fields read-only
    #[must_use]
    pub fn read_only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only_fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Skip fields entirely
    #[must_use]
    pub fn skip<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Hide a field owned by another widget
    #[must_use]
    pub fn ignore(mut self, fieldname: impl Into<String>) -> Self {
        self.ignore.insert(fieldname.into(), true);
        self
    }

    /// Show fields as required
    #[must_use]
    pub fn extra_required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_required.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// Renders a stack of fields from descriptors and form state
#[derive(Debug, Clone, Default)]
pub struct DynamicForm {
    renderer: FieldRenderer,
    options: FormOptions,
}

impl DynamicForm {
    /// Create form with renderer and options
    #[inline]
    #[must_use]
    pub fn new(renderer: FieldRenderer, options: FormOptions) -> Self {
        Self { renderer, options }
    }

    /// Rendering options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    /// Field renderer, also used to turn control events into values
    #[inline]
    #[must_use]
    pub fn renderer(&self) -> &FieldRenderer {
        &self.renderer
    }

    /// Render the requested fields in request order
    ///
    /// A field is rendered when it has a descriptor, is not hidden, skipped
    /// or ignored, and is not a layout marker.
    #[must_use]
    pub fn render<S: AsRef<str>>(
        &self,
        descriptors: Option<&[FieldDescriptor]>,
        requested: Option<&[S]>,
        state: &FormState,
    ) -> Vec<RenderedField> {
        let Some(descriptors) = descriptors else {
            tracing::warn!("no field descriptors, rendering nothing");
            return Vec::new();
        };
        let Some(requested) = requested else {
            tracing::warn!("no requested fields, rendering nothing");
            return Vec::new();
        };

        let mut seen = HashSet::with_capacity(requested.len());
        let mut out = Vec::with_capacity(requested.len());
        for name in requested.iter().map(AsRef::as_ref) {
            if !seen.insert(name) || !self.is_wanted(name) {
                continue;
            }
            let Some(descriptor) = descriptors.iter().find(|d| d.fieldname == name) else {
                tracing::debug!(field = name, "requested field has no descriptor");
                continue;
            };
            if descriptor.hidden {
                continue;
            }
            let binding = Binding::new(descriptor, state.value(name))
                .with_error(state.error(name))
                .required(self.is_required(descriptor))
                .read_only(self.is_read_only(descriptor))
                .with_link(state.link(name));
            if let Some(field) = self.renderer.render(descriptor, binding) {
                out.push(field);
            }
        }
        out
    }

    /// Render every field of the descriptor list in backend order
    #[must_use]
    pub fn render_all(&self, descriptors: &[FieldDescriptor], state: &FormState) -> Vec<RenderedField> {
        let names: Vec<&str> = descriptors.iter().map(|d| d.fieldname.as_str()).collect();
        self.render(Some(descriptors), Some(names.as_slice()), state)
    }

    fn is_wanted(&self, fieldname: &str) -> bool {
        !self.options.skip.contains(fieldname) && !self.options.ignore.get(fieldname).copied().unwrap_or(false)
    }

    /// Asterisk shown: backend flag, business rule, or caller override
    fn is_required(&self, descriptor: &FieldDescriptor) -> bool {
        descriptor.required
            || is_forced_required(&descriptor.fieldname)
            || self.options.extra_required.contains(&descriptor.fieldname)
    }

    fn is_read_only(&self, descriptor: &FieldDescriptor) -> bool {
        self.options.read_only
            || descriptor.read_only
            || self.options.read_only_fields.contains(&descriptor.fieldname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Control;
    use doctype_meta::FieldType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("first_name", FieldType::Data).with_label("First Name"),
            FieldDescriptor::new("last_name", FieldType::Data).with_label("Last Name"),
            FieldDescriptor::new("sb", FieldType::SectionBreak),
            FieldDescriptor::new("secret", FieldType::Data).hidden(),
            FieldDescriptor::new("status", FieldType::Select).with_options("Open\nLost"),
            FieldDescriptor::new("docs", FieldType::Table)
                .with_sub_fields(vec![FieldDescriptor::new("file", FieldType::Attach)]),
        ]
    }

    fn names(rendered: &[RenderedField]) -> Vec<&str> {
        rendered.iter().map(|f| f.fieldname.as_str()).collect()
    }

    #[test]
    fn guards_render_nothing() {
        let state = FormState::new(&fields());
        let form = DynamicForm::default();
        assert!(form.render::<&str>(None, Some(&["first_name"][..]), &state).is_empty());
        assert!(form.render::<&str>(Some(fields().as_slice()), None, &state).is_empty());
    }

    #[test]
    fn renders_in_request_order_and_filters() {
        let fields = fields();
        let state = FormState::new(&fields);
        let form = DynamicForm::new(FieldRenderer::new(), FormOptions::default().skip(["status"]).ignore("docs"));
        let rendered = form.render(
            Some(fields.as_slice()),
            Some(&["last_name", "sb", "secret", "unknown", "status", "docs", "first_name", "last_name"][..]),
            &state,
        );
        assert_eq!(names(&rendered), vec!["last_name", "first_name"]);
    }

    #[test]
    fn last_name_shows_required() {
        let fields = fields();
        let state = FormState::new(&fields);
        let rendered = DynamicForm::default().render_all(&fields, &state);
        let last = rendered.iter().find(|f| f.fieldname == "last_name").unwrap();
        assert!(last.required);
        assert!(!fields[1].required);
    }

    #[test]
    fn read_only_options() {
        let fields = fields();
        let state = FormState::new(&fields);
        let form = DynamicForm::new(
            FieldRenderer::new(),
            FormOptions::default().read_only_fields(["first_name"]),
        );
        let rendered = form.render_all(&fields, &state);
        assert!(rendered[0].read_only);
        assert!(!rendered[1].read_only);

        let all = DynamicForm::new(FieldRenderer::new(), FormOptions::default().read_only(true)).render_all(&fields, &state);
        assert!(all.iter().all(|f| f.read_only));
        let table = all.iter().find(|f| f.fieldname == "docs").unwrap();
        assert!(matches!(table.control, Control::Table { can_add: false, .. }));
    }

    #[test]
    fn errors_are_bound_to_controls() {
        let fields = fields();
        let mut state = FormState::new(&fields);
        let schema = crate::schema::SchemaBuilder::new().build(Some(fields.as_slice()));
        state.validate(&schema);
        let rendered = DynamicForm::default().render(Some(fields.as_slice()), Some(&["last_name"][..]), &state);
        assert_eq!(rendered[0].error.as_deref(), Some("Last Name is required"));
        state.set("last_name", json!("Rao"));
        let rendered = DynamicForm::default().render(Some(fields.as_slice()), Some(&["last_name"][..]), &state);
        assert_eq!(rendered[0].error, None);
    }
}
