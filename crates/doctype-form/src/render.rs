//! Field renderer
//!
//! Pure dispatch on the field type tag: one descriptor plus its bound value
//! becomes a framework-neutral control blueprint, and control events become
//! stored values. Layout markers render nothing. Unknown tags render a
//! visible placeholder instead of disappearing.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value as JsonValue;

use doctype_meta::{is_forced_required, FieldDescriptor, FieldType, OptionItem, SYSTEM_KEYS};

use crate::error::InputError;
use crate::format::{self, DateMode, NumberFormat, ParseNumberError};
use crate::richtext;
use crate::state::LinkResolution;
use crate::table::TableView;

/// Renderer configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Host prefix composed with server-relative attachment paths
    pub host: Option<String>,
    /// Days added to a picked Date before it is stored
    pub date_day_offset: i64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            host: None,
            date_day_offset: 1,
        }
    }
}

impl RenderOptions {
    /// With attachment host prefix
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// With Date offset in days
    #[inline]
    #[must_use]
    pub fn with_date_day_offset(mut self, days: i64) -> Self {
        self.date_day_offset = days;
        self
    }
}

/// Framework-neutral control blueprint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum Control {
    /// Single-line input
    TextInput {
        /// Displayed text
        value: String,
        /// Grouped numeric formatting
        #[serde(skip_serializing_if = "Option::is_none")]
        numeric: Option<NumberFormat>,
        /// Phone number input
        phone: bool,
    },
    /// Plain numeric input
    NumberInput {
        /// Displayed text
        value: String,
    },
    /// Multi-line input
    TextArea {
        /// Displayed text
        value: String,
    },
    /// Closed dropdown
    Select {
        /// Choices in declaration order
        options: Vec<OptionItem>,
        /// Selected value
        selected: Option<String>,
    },
    /// Searchable dropdown over records of another doctype
    Link {
        /// Target doctype
        target: Option<String>,
        /// Resolved choices
        options: Vec<OptionItem>,
        /// Selected value
        selected: Option<String>,
        /// Offers "create new linked record"
        allow_create: bool,
    },
    /// Link whose target doctype comes from another field
    DynamicLink {
        /// Field holding the target doctype
        source_field: String,
        /// Currently resolved target doctype
        target: Option<String>,
        /// Resolved choices
        options: Vec<OptionItem>,
        /// Selected value
        selected: Option<String>,
        /// Options must be re-resolved
        stale: bool,
    },
    /// Embedded sub-table
    Table {
        /// Tabular view of the rows
        view: TableView,
        /// Rows can be added
        can_add: bool,
    },
    /// Multi-select chips
    MultiSelect {
        /// Choices
        options: Vec<OptionItem>,
        /// Selected values
        selected: Vec<String>,
    },
    /// Date, time or datetime picker
    DatePicker {
        /// Picker precision
        mode: DateMode,
        /// Stored value
        value: String,
    },
    /// Boolean toggle
    Checkbox {
        /// Toggle state
        checked: bool,
    },
    /// Rich text editor
    RichText {
        /// Normalized HTML
        html: String,
    },
    /// File picker
    Attachment {
        /// Server-relative path
        path: String,
        /// Path composed with the host prefix
        url: Option<String>,
        /// Thumbnail preview
        image: bool,
        /// Value can be cleared
        clearable: bool,
    },
    /// Color swatch
    ColorPicker {
        /// Hex string
        hex: String,
    },
    /// Non-editable display
    ReadOnly {
        /// Displayed text
        text: String,
    },
    /// Action button
    Button {
        /// Button caption
        label: String,
    },
    /// Placeholder for a type tag without control
    Unsupported {
        /// Unknown tag
        fieldtype: String,
    },
}

/// One rendered field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    /// Field key
    pub fieldname: String,
    /// Label
    pub label: String,
    /// Asterisk shown
    pub required: bool,
    /// Editing disabled
    pub read_only: bool,
    /// Validation error shown beneath the control
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Control blueprint
    pub control: Control,
}

/// What a control is bound to
#[derive(Debug, Clone, Copy)]
pub struct Binding<'a> {
    /// Current value
    pub value: &'a JsonValue,
    /// Current validation error
    pub error: Option<&'a str>,
    /// Effective required flag
    pub required: bool,
    /// Effective read-only flag
    pub read_only: bool,
    /// Resolved target of a Dynamic Link
    pub link: Option<&'a LinkResolution>,
}

impl<'a> Binding<'a> {
    /// Bind a value with the descriptor's own flags
    #[must_use]
    pub fn new(descriptor: &FieldDescriptor, value: &'a JsonValue) -> Self {
        Self {
            value,
            error: None,
            required: descriptor.required || is_forced_required(&descriptor.fieldname),
            read_only: descriptor.read_only,
            link: None,
        }
    }

    /// With validation error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: Option<&'a str>) -> Self {
        self.error = error;
        self
    }

    /// With required flag
    #[inline]
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// With read-only flag
    #[inline]
    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// With Dynamic Link resolution
    #[inline]
    #[must_use]
    pub fn with_link(mut self, link: Option<&'a LinkResolution>) -> Self {
        self.link = link;
        self
    }
}

/// Control event coming back from a rendered control
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Text typed into an input
    Text(String),
    /// Instant picked in a date/time picker
    Pick(NaiveDateTime),
    /// Checkbox toggled
    Toggle(bool),
    /// Dropdown selection (`None` clears)
    Select(Option<String>),
    /// Multi-select chip toggled
    ToggleOption(String),
    /// File attached, as a server-relative path
    Attach(String),
    /// Color picked
    Color(String),
    /// Value cleared
    Clear,
}

impl ControlEvent {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Pick(_) => "pick",
            Self::Toggle(_) => "toggle",
            Self::Select(_) => "select",
            Self::ToggleOption(_) => "toggle-option",
            Self::Attach(_) => "attach",
            Self::Color(_) => "color",
            Self::Clear => "clear",
        }
    }
}

/// Maps descriptors to controls and control events to values
#[derive(Debug, Clone, Default)]
pub struct FieldRenderer {
    options: RenderOptions,
}

impl FieldRenderer {
    /// Create renderer with default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create renderer with options
    #[inline]
    #[must_use]
    pub fn with_options(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Renderer options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one field; layout markers render `None`
    #[must_use]
    pub fn render(&self, descriptor: &FieldDescriptor, binding: Binding<'_>) -> Option<RenderedField> {
        if descriptor.fieldtype.is_layout() {
            return None;
        }
        Some(RenderedField {
            fieldname: descriptor.fieldname.clone(),
            label: descriptor.display_label().to_string(),
            required: binding.required,
            read_only: binding.read_only,
            error: binding.error.map(str::to_string),
            help: descriptor.description.clone().filter(|d| !d.is_empty()),
            control: self.control(descriptor, binding),
        })
    }

    fn control(&self, d: &FieldDescriptor, b: Binding<'_>) -> Control {
        let value = b.value;
        match &d.fieldtype {
            FieldType::Data | FieldType::Text | FieldType::Autocomplete => Control::TextInput {
                value: format::value_text(value),
                numeric: None,
                phone: is_phone_label(d.display_label()),
            },
            FieldType::Int | FieldType::Float if is_phone_label(d.display_label()) => Control::TextInput {
                value: format::value_text(value),
                numeric: None,
                phone: true,
            },
            FieldType::Int => numeric_input(NumberFormat::INT, value),
            FieldType::Float => numeric_input(NumberFormat::FLOAT, value),
            FieldType::Currency | FieldType::Percent | FieldType::Duration => Control::NumberInput {
                value: format::value_text(value),
            },
            FieldType::SmallText | FieldType::LongText => Control::TextArea {
                value: format::value_text(value),
            },
            FieldType::Select => Control::Select {
                options: d.select_options(),
                selected: selected_value(value),
            },
            FieldType::Link => Control::Link {
                target: d.link_target().map(str::to_string),
                options: d.options_list.clone(),
                selected: selected_value(value),
                allow_create: d.allow_create && !b.read_only,
            },
            FieldType::DynamicLink => Control::DynamicLink {
                source_field: d.dynamic_link_source().unwrap_or_default().to_string(),
                target: b.link.and_then(|l| l.doctype.clone()),
                options: b
                    .link
                    .map_or_else(|| d.options_list.clone(), |l| l.options.clone()),
                selected: selected_value(value),
                stale: b.link.is_some_and(|l| l.stale),
            },
            FieldType::Table => Control::Table {
                view: TableView::build(d, value, None),
                can_add: !b.read_only,
            },
            FieldType::TableMultiSelect => Control::MultiSelect {
                options: d.choices(),
                selected: multi_values(value),
            },
            FieldType::Date => date_picker(DateMode::Date, value),
            FieldType::Time => date_picker(DateMode::Time, value),
            FieldType::Datetime => date_picker(DateMode::Datetime, value),
            FieldType::Check => Control::Checkbox {
                checked: format::is_checked(value),
            },
            FieldType::TextEditor | FieldType::Html => Control::RichText {
                html: richtext::to_html(value),
            },
            FieldType::Attach | FieldType::AttachImage => {
                let path = format::value_text(value);
                let image = d.fieldtype == FieldType::AttachImage;
                Control::Attachment {
                    url: self.attachment_url(&path),
                    clearable: image && !path.is_empty() && !b.read_only,
                    image,
                    path,
                }
            }
            FieldType::Color => Control::ColorPicker {
                hex: format::value_text(value),
            },
            FieldType::ReadOnly => Control::ReadOnly {
                text: format::value_text(value),
            },
            FieldType::Button => Control::Button {
                label: d.display_label().to_string(),
            },
            FieldType::SectionBreak | FieldType::ColumnBreak | FieldType::TabBreak | FieldType::Other(_) => {
                Control::Unsupported {
                    fieldtype: d.fieldtype.to_string(),
                }
            }
        }
    }

    /// Compose an attachment path with the host prefix
    #[must_use]
    pub fn attachment_url(&self, path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        Some(match &self.options.host {
            Some(host) => format!(
                "{}/{}",
                host.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        })
    }

    /// Turn a control event into the value to store
    ///
    /// # Errors
    /// - `InputError::ReadOnly` for read-only and structural fields
    /// - `InputError::Mismatch` if the event does not apply to the field type
    /// - `InputError::NotANumber`, `InvalidTemporal`, `InvalidColor` for
    ///   unparseable text
    /// - `InputError::OutOfRange` for numbers or shifted dates that cannot be
    ///   stored
    pub fn apply(
        &self,
        descriptor: &FieldDescriptor,
        current: &JsonValue,
        event: ControlEvent,
    ) -> Result<JsonValue, InputError> {
        let ty = &descriptor.fieldtype;
        if descriptor.read_only || ty.is_structural() {
            return Err(InputError::ReadOnly(descriptor.fieldname.clone()));
        }

        match (ty, event) {
            (_, ControlEvent::Clear) => Ok(empty_value(ty)),

            (FieldType::Int, ControlEvent::Text(text)) => {
                parse_with(descriptor, &text, |t| NumberFormat::INT.parse(t))
            }
            (FieldType::Float, ControlEvent::Text(text)) => {
                parse_with(descriptor, &text, |t| NumberFormat::FLOAT.parse(t))
            }
            (FieldType::Currency | FieldType::Percent | FieldType::Duration, ControlEvent::Text(text)) => {
                parse_with(descriptor, &text, format::parse_plain_number)
            }

            (FieldType::Date | FieldType::Time | FieldType::Datetime, ControlEvent::Pick(at)) => {
                let stored = match ty {
                    FieldType::Date => format::format_date(at, self.options.date_day_offset).ok_or_else(|| {
                        InputError::OutOfRange {
                            field: descriptor.fieldname.clone(),
                            input: at.to_string(),
                        }
                    })?,
                    FieldType::Time => format::format_time(at),
                    _ => format::format_datetime(at),
                };
                Ok(JsonValue::String(stored))
            }
            (FieldType::Date | FieldType::Time | FieldType::Datetime, ControlEvent::Text(text)) => {
                let mode = match ty {
                    FieldType::Date => DateMode::Date,
                    FieldType::Time => DateMode::Time,
                    _ => DateMode::Datetime,
                };
                let text = text.trim().to_string();
                if text.is_empty() || format::is_valid_temporal(mode, &text) {
                    Ok(JsonValue::String(text))
                } else {
                    Err(InputError::InvalidTemporal {
                        field: descriptor.fieldname.clone(),
                        fieldtype: ty.to_string(),
                        input: text,
                    })
                }
            }

            (FieldType::Check, ControlEvent::Toggle(on)) => Ok(JsonValue::Bool(on)),

            (FieldType::Select | FieldType::Link | FieldType::DynamicLink, ControlEvent::Select(choice)) => {
                Ok(JsonValue::String(choice.unwrap_or_default()))
            }

            (FieldType::TableMultiSelect, ControlEvent::ToggleOption(option)) => {
                let mut selected = multi_values(current);
                if let Some(pos) = selected.iter().position(|v| *v == option) {
                    selected.remove(pos);
                } else {
                    selected.push(option);
                }
                Ok(JsonValue::Array(selected.into_iter().map(JsonValue::String).collect()))
            }

            (FieldType::Attach | FieldType::AttachImage, ControlEvent::Attach(path)) => Ok(JsonValue::String(path)),

            (FieldType::Color, ControlEvent::Color(hex) | ControlEvent::Text(hex)) => {
                if hex.trim().is_empty() || format::is_hex_color(&hex) {
                    Ok(JsonValue::String(hex.trim().to_string()))
                } else {
                    Err(InputError::InvalidColor {
                        field: descriptor.fieldname.clone(),
                        input: hex,
                    })
                }
            }

            (
                FieldType::Data
                | FieldType::Text
                | FieldType::SmallText
                | FieldType::LongText
                | FieldType::TextEditor
                | FieldType::Html
                | FieldType::Autocomplete
                | FieldType::Other(_),
                ControlEvent::Text(text),
            ) => Ok(JsonValue::String(text)),

            (_, event) => Err(InputError::Mismatch {
                field: descriptor.fieldname.clone(),
                fieldtype: ty.to_string(),
                event: event.kind(),
            }),
        }
    }
}

/// Empty value of a field type: `[]` for multi-valued types, `""` otherwise
#[must_use]
pub fn empty_value(fieldtype: &FieldType) -> JsonValue {
    if fieldtype.is_multi_valued() {
        JsonValue::Array(Vec::new())
    } else {
        JsonValue::String(String::new())
    }
}

/// Labels starting or ending with "mobile" or "phone" get a phone input
#[must_use]
pub fn is_phone_label(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    ["mobile", "phone"]
        .iter()
        .any(|word| label.starts_with(word) || label.ends_with(word))
}

fn parse_with(
    descriptor: &FieldDescriptor,
    text: &str,
    parse: impl Fn(&str) -> Result<JsonValue, ParseNumberError>,
) -> Result<JsonValue, InputError> {
    let field = descriptor.fieldname.clone();
    let input = text.to_string();
    parse(text).map_err(|e| match e {
        ParseNumberError::Invalid => InputError::NotANumber { field, input },
        ParseNumberError::OutOfRange => InputError::OutOfRange { field, input },
    })
}

fn numeric_input(format: NumberFormat, value: &JsonValue) -> Control {
    Control::TextInput {
        value: format.display(value),
        numeric: Some(format),
        phone: false,
    }
}

fn date_picker(mode: DateMode, value: &JsonValue) -> Control {
    Control::DatePicker {
        mode,
        value: format::value_text(value),
    }
}

fn selected_value(value: &JsonValue) -> Option<String> {
    Some(format::value_text(value)).filter(|v| !v.is_empty())
}

/// Selected values of a multi-select: plain strings, or the first non-system
/// string of each child row
fn multi_values(value: &JsonValue) -> Vec<String> {
    let JsonValue::Array(items) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Object(row) => row
                .iter()
                .filter(|(k, _)| !SYSTEM_KEYS.contains(&k.as_str()))
                .find_map(|(_, v)| v.as_str().map(str::to_string)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn render(d: &FieldDescriptor, value: &JsonValue) -> Option<RenderedField> {
        FieldRenderer::new().render(d, Binding::new(d, value))
    }

    #[test]
    fn layout_markers_render_nothing() {
        for ty in [FieldType::SectionBreak, FieldType::ColumnBreak, FieldType::TabBreak] {
            let d = FieldDescriptor::new("x", ty);
            assert!(render(&d, &JsonValue::Null).is_none());
        }
    }

    #[test]
    fn unknown_tag_renders_placeholder() {
        let d = FieldDescriptor::new("geo", FieldType::Other("Geolocation".into()));
        let field = render(&d, &JsonValue::Null).unwrap();
        assert_eq!(
            field.control,
            Control::Unsupported {
                fieldtype: "Geolocation".into()
            }
        );
    }

    #[test]
    fn select_options_follow_declaration_order() {
        let d = FieldDescriptor::new("plot_status", FieldType::Select).with_options("New\nBooked\nSold");
        let field = render(&d, &json!("Booked")).unwrap();
        let Control::Select { options, selected } = field.control else {
            panic!("expected select");
        };
        let values: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["New", "Booked", "Sold"]);
        assert_eq!(selected.as_deref(), Some("Booked"));
    }

    #[test]
    fn link_carries_allow_create() {
        let d = FieldDescriptor::new("customer", FieldType::Link)
            .with_options("Customer")
            .with_options_list(vec![OptionItem::new("Asha", "CUST-1")])
            .without_create();
        let field = render(&d, &json!("")).unwrap();
        assert_eq!(
            field.control,
            Control::Link {
                target: Some("Customer".into()),
                options: vec![OptionItem::new("Asha", "CUST-1")],
                selected: None,
                allow_create: false,
            }
        );
    }

    #[test]
    fn phone_labels_render_phone_inputs() {
        assert!(is_phone_label("Mobile No"));
        assert!(is_phone_label("Alternate Phone"));
        assert!(!is_phone_label("Email"));
        let d = FieldDescriptor::new("mobile_no", FieldType::Data).with_label("Mobile No");
        let field = render(&d, &json!("98450")).unwrap();
        assert!(matches!(field.control, Control::TextInput { phone: true, .. }));
    }

    #[test]
    fn numeric_phone_label_wins_over_grouping() {
        let d = FieldDescriptor::new("mobile", FieldType::Int).with_label("Mobile");
        let field = render(&d, &json!(9_845_012_345_i64)).unwrap();
        assert_eq!(
            field.control,
            Control::TextInput {
                value: "9845012345".into(),
                numeric: None,
                phone: true,
            }
        );
        let f = FieldDescriptor::new("alt", FieldType::Float).with_label("Alternate Phone");
        assert!(matches!(render(&f, &json!(1)).unwrap().control, Control::TextInput { phone: true, numeric: None, .. }));
    }

    #[test]
    fn oversized_input_is_out_of_range() {
        let r = FieldRenderer::new();
        let d = FieldDescriptor::new("area", FieldType::Int);
        assert!(matches!(
            r.apply(&d, &JsonValue::Null, ControlEvent::Text("99999999999999999999".into())),
            Err(InputError::OutOfRange { .. })
        ));
        assert!(matches!(
            r.apply(&d, &JsonValue::Null, ControlEvent::Text("12x".into())),
            Err(InputError::NotANumber { .. })
        ));

        let date = FieldDescriptor::new("visit", FieldType::Date);
        let at = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let far = FieldRenderer::with_options(RenderOptions::default().with_date_day_offset(i64::MAX));
        assert!(matches!(
            far.apply(&date, &JsonValue::Null, ControlEvent::Pick(at)),
            Err(InputError::OutOfRange { .. })
        ));
    }

    #[test]
    fn int_input_is_grouped() {
        let d = FieldDescriptor::new("area", FieldType::Int);
        let field = render(&d, &json!(12500)).unwrap();
        assert!(matches!(field.control, Control::TextInput { ref value, .. } if value == "12,500"));
        let stored = FieldRenderer::new()
            .apply(&d, &JsonValue::Null, ControlEvent::Text("12,500".into()))
            .unwrap();
        assert_eq!(stored, json!(12500));
    }

    #[test]
    fn picked_date_is_shifted_one_day() {
        let d = FieldDescriptor::new("visit", FieldType::Date);
        let at = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let stored = FieldRenderer::new().apply(&d, &JsonValue::Null, ControlEvent::Pick(at)).unwrap();
        assert_eq!(stored, json!("2025-01-16"));

        let unshifted = FieldRenderer::with_options(RenderOptions::default().with_date_day_offset(0))
            .apply(&d, &JsonValue::Null, ControlEvent::Pick(at))
            .unwrap();
        assert_eq!(unshifted, json!("2025-01-15"));
    }

    #[test]
    fn rich_text_delta_is_normalized() {
        let d = FieldDescriptor::new("notes", FieldType::TextEditor);
        let field = render(&d, &json!({"ops": [{"insert": "Call back\n"}]})).unwrap();
        assert_eq!(
            field.control,
            Control::RichText {
                html: "<p>Call back</p>".into()
            }
        );
    }

    #[test]
    fn attachment_url_uses_host() {
        let renderer = FieldRenderer::with_options(RenderOptions::default().with_host("https://erp.example.com/"));
        let d = FieldDescriptor::new("photo", FieldType::AttachImage);
        let field = renderer.render(&d, Binding::new(&d, &json!("/files/a.png"))).unwrap();
        assert_eq!(
            field.control,
            Control::Attachment {
                path: "/files/a.png".into(),
                url: Some("https://erp.example.com/files/a.png".into()),
                image: true,
                clearable: true,
            }
        );
    }

    #[test]
    fn multiselect_toggles() {
        let d = FieldDescriptor::new("interests", FieldType::TableMultiSelect);
        let r = FieldRenderer::new();
        let v = r.apply(&d, &json!([]), ControlEvent::ToggleOption("Villa".into())).unwrap();
        let v = r.apply(&d, &v, ControlEvent::ToggleOption("Plot".into())).unwrap();
        assert_eq!(v, json!(["Villa", "Plot"]));
        let v = r.apply(&d, &v, ControlEvent::ToggleOption("Villa".into())).unwrap();
        assert_eq!(v, json!(["Plot"]));
    }

    #[test]
    fn read_only_and_mismatched_events_are_rejected() {
        let r = FieldRenderer::new();
        let ro = FieldDescriptor::new("plot_no", FieldType::Data).read_only();
        assert!(matches!(
            r.apply(&ro, &JsonValue::Null, ControlEvent::Text("1".into())),
            Err(InputError::ReadOnly(_))
        ));
        let check = FieldDescriptor::new("active", FieldType::Check);
        assert!(matches!(
            r.apply(&check, &JsonValue::Null, ControlEvent::Text("1".into())),
            Err(InputError::Mismatch { event: "text", .. })
        ));
    }

    #[test]
    fn controls_serialize_with_component_tag() {
        let control = Control::Checkbox { checked: true };
        assert_eq!(
            serde_json::to_value(&control).unwrap(),
            json!({"component": "checkbox", "checked": true})
        );
    }
}
