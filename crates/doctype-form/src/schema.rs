//! Validation schema builder
//!
//! Turns a descriptor list into per-field rules keyed by fieldname. Layout
//! markers, buttons and read-only displays carry no value and get no rule.

use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

use doctype_meta::{is_empty_value, is_forced_required, FieldDescriptor, FieldType, Record};

use crate::format::{self, DateMode};
use crate::richtext;

/// How a required Table field is checked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableRequiredPolicy {
    /// Required tables need at least one row
    #[default]
    AtLeastOneRow,
    /// Tables are never checked for emptiness
    Unconstrained,
}

/// How a value outside the resolved option list is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionPolicy {
    /// Soft warning; option lists can be stale
    #[default]
    Warn,
    /// Hard validation error
    Reject,
}

/// Schema builder configuration
#[derive(Debug, Clone, Default)]
pub struct SchemaOptions {
    /// Fieldnames left out of the schema
    pub exclude: HashSet<String>,
    /// Fieldnames required although the backend does not mark them
    pub extra_required: HashSet<String>,
    /// Required Table policy
    pub table_required: TableRequiredPolicy,
    /// Option list policy
    pub option_policy: OptionPolicy,
}

impl SchemaOptions {
    /// Leave fields out of the schema
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Treat fields as required
    #[must_use]
    pub fn extra_required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_required.extend(fields.into_iter().map(Into::into));
        self
    }

    /// With Table required policy
    #[inline]
    #[must_use]
    pub fn with_table_required(mut self, policy: TableRequiredPolicy) -> Self {
        self.table_required = policy;
        self
    }

    /// With option list policy
    #[inline]
    #[must_use]
    pub fn with_option_policy(mut self, policy: OptionPolicy) -> Self {
        self.option_policy = policy;
        self
    }
}

/// Type rule of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRule {
    /// Any value
    Any,
    /// Must parse as a number
    Number,
    /// Date / time string
    Temporal {
        /// Accepted precision
        mode: DateMode,
    },
    /// Must be one of the listed values when the list is non-empty
    OneOf {
        /// Allowed values in declaration order
        values: Vec<String>,
    },
    /// Hex color string
    Color,
    /// Array of rows or selections
    List,
    /// Rich text; empty markup counts as empty
    RichText,
}

/// Rule set of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldRule {
    /// Field key
    pub fieldname: String,
    /// Label used in messages
    pub label: String,
    /// Value must be non-empty
    pub required: bool,
    /// Type-derived rule
    pub rule: TypeRule,
}

impl FieldRule {
    fn required_message(&self) -> String {
        format!("{} is required", self.label)
    }

    fn type_message(&self) -> Option<String> {
        let label = &self.label;
        Some(match &self.rule {
            TypeRule::Number => format!("{label} must be a number"),
            TypeRule::Temporal { mode: DateMode::Date } => {
                format!("{label} must be a date (YYYY-MM-DD)")
            }
            TypeRule::Temporal { mode: DateMode::Time } => {
                format!("{label} must be a time (HH:MM:SS)")
            }
            TypeRule::Temporal {
                mode: DateMode::Datetime,
            } => format!("{label} must be a date and time"),
            TypeRule::OneOf { .. } => format!("{label} must be one of the available options"),
            TypeRule::Color => format!("{label} must be a hex color"),
            TypeRule::List => format!("{label} must be a list"),
            TypeRule::Any | TypeRule::RichText => return None,
        })
    }

    fn is_empty(&self, value: &JsonValue) -> bool {
        match self.rule {
            TypeRule::RichText => richtext::is_blank(value),
            _ => is_empty_value(value),
        }
    }

    fn type_ok(&self, value: &JsonValue) -> bool {
        match &self.rule {
            TypeRule::Any | TypeRule::RichText => true,
            TypeRule::Number => format::is_numeric_value(value),
            TypeRule::Temporal { mode } => value
                .as_str()
                .is_some_and(|text| format::is_valid_temporal(*mode, text)),
            TypeRule::OneOf { values } => {
                values.is_empty()
                    || value
                        .as_str()
                        .map_or_else(|| values.contains(&value.to_string()), |s| values.iter().any(|v| v == s))
            }
            TypeRule::Color => value.as_str().is_some_and(format::is_hex_color),
            TypeRule::List => value.is_array(),
        }
    }
}

/// Outcome of checking one value against a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCheck {
    /// Value satisfies the rule
    Ok,
    /// Value blocks submission
    Error(String),
    /// Value is suspicious but accepted
    Warning(String),
}

/// Validation schema of one form
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationSchema {
    rules: IndexMap<String, FieldRule>,
    #[serde(skip)]
    option_policy: OptionPolicy,
}

impl ValidationSchema {
    /// Rule of one field
    #[inline]
    #[must_use]
    pub fn rule(&self, fieldname: &str) -> Option<&FieldRule> {
        self.rules.get(fieldname)
    }

    /// Whether a field has a rule
    #[inline]
    #[must_use]
    pub fn contains(&self, fieldname: &str) -> bool {
        self.rules.contains_key(fieldname)
    }

    /// Number of fields with a rule
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// No rules
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in descriptor order
    pub fn rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.values()
    }

    /// Check one value
    #[must_use]
    pub fn check(&self, fieldname: &str, value: &JsonValue) -> FieldCheck {
        let Some(rule) = self.rules.get(fieldname) else {
            return FieldCheck::Ok;
        };
        if rule.is_empty(value) {
            return if rule.required {
                FieldCheck::Error(rule.required_message())
            } else {
                FieldCheck::Ok
            };
        }
        if rule.type_ok(value) {
            return FieldCheck::Ok;
        }
        let Some(message) = rule.type_message() else {
            return FieldCheck::Ok;
        };
        match (&rule.rule, self.option_policy) {
            (TypeRule::OneOf { .. }, OptionPolicy::Warn) => FieldCheck::Warning(message),
            _ => FieldCheck::Error(message),
        }
    }

    /// Validate a whole record; absent fields count as empty
    #[must_use]
    pub fn validate(&self, record: &Record) -> ValidationReport {
        let mut report = ValidationReport::default();
        for name in self.rules.keys() {
            let value = record.get(name).unwrap_or(&JsonValue::Null);
            match self.check(name, value) {
                FieldCheck::Ok => {}
                FieldCheck::Error(message) => {
                    report.errors.insert(name.clone(), message);
                }
                FieldCheck::Warning(message) => {
                    report.warnings.insert(name.clone(), message);
                }
            }
        }
        report
    }
}

/// Per-field validation errors and warnings, in schema order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Blocking errors
    pub errors: IndexMap<String, String>,
    /// Soft warnings
    pub warnings: IndexMap<String, String>,
}

impl ValidationReport {
    /// No blocking errors
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error of one field
    #[inline]
    #[must_use]
    pub fn error(&self, fieldname: &str) -> Option<&str> {
        self.errors.get(fieldname).map(String::as_str)
    }

    /// Warning of one field
    #[inline]
    #[must_use]
    pub fn warning(&self, fieldname: &str) -> Option<&str> {
        self.warnings.get(fieldname).map(String::as_str)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for message in self.errors.values() {
            if !first {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
            first = false;
        }
        Ok(())
    }
}

/// Builds a [`ValidationSchema`] from descriptors
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: SchemaOptions,
}

impl SchemaBuilder {
    /// Create builder with default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create builder with options
    #[inline]
    #[must_use]
    pub fn with_options(options: SchemaOptions) -> Self {
        Self { options }
    }

    /// Build the schema; a missing descriptor list yields an empty schema
    #[must_use]
    pub fn build(&self, descriptors: Option<&[FieldDescriptor]>) -> ValidationSchema {
        let mut rules = IndexMap::new();
        for field in descriptors.unwrap_or_default() {
            if field.fieldtype.is_structural() || self.options.exclude.contains(&field.fieldname) {
                continue;
            }
            rules.insert(field.fieldname.clone(), self.field_rule(field));
        }
        ValidationSchema {
            rules,
            option_policy: self.options.option_policy,
        }
    }

    fn field_rule(&self, field: &FieldDescriptor) -> FieldRule {
        let rule = match &field.fieldtype {
            ty if ty.is_numeric() => TypeRule::Number,
            FieldType::Date => TypeRule::Temporal { mode: DateMode::Date },
            FieldType::Time => TypeRule::Temporal { mode: DateMode::Time },
            FieldType::Datetime => TypeRule::Temporal {
                mode: DateMode::Datetime,
            },
            FieldType::Select | FieldType::Link => TypeRule::OneOf {
                values: field.choices().into_iter().map(|o| o.value).collect(),
            },
            FieldType::Table | FieldType::TableMultiSelect => TypeRule::List,
            FieldType::Color => TypeRule::Color,
            FieldType::TextEditor | FieldType::Html => TypeRule::RichText,
            _ => TypeRule::Any,
        };

        // A hidden field cannot be filled in, so its required flag is not enforced
        let mut required = !field.hidden
            && (field.required
                || is_forced_required(&field.fieldname)
                || self.options.extra_required.contains(&field.fieldname));
        if field.fieldtype == FieldType::Table
            && self.options.table_required == TableRequiredPolicy::Unconstrained
        {
            required = false;
        }

        FieldRule {
            fieldname: field.fieldname.clone(),
            label: field.display_label().to_string(),
            required,
            rule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctype_meta::OptionItem;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn plot_detail() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("plot_no", FieldType::Data)
                .with_label("Plot No")
                .required(),
            FieldDescriptor::new("plot_status", FieldType::Select)
                .with_label("Plot Status")
                .with_options("New\nBooked\nSold"),
        ]
    }

    #[test]
    fn missing_descriptors_build_empty_schema() {
        assert!(SchemaBuilder::new().build(None).is_empty());
    }

    #[test]
    fn required_empty_value_fails() {
        let schema = SchemaBuilder::new().build(Some(plot_detail().as_slice()));
        let record = Record::new().with("plot_no", "").with("plot_status", "Booked");
        let report = schema.validate(&record);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.error("plot_no"), Some("Plot No is required"));
        assert!(report.error("plot_status").is_none());
    }

    #[test]
    fn structural_fields_get_no_rule() {
        let fields = vec![
            FieldDescriptor::new("sb", FieldType::SectionBreak),
            FieldDescriptor::new("cb", FieldType::ColumnBreak).required(),
            FieldDescriptor::new("btn", FieldType::Button),
            FieldDescriptor::new("ro", FieldType::ReadOnly),
            FieldDescriptor::new("name1", FieldType::Data),
        ];
        let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
        assert_eq!(schema.len(), 1);
        assert!(schema.contains("name1"));
    }

    #[test]
    fn numeric_and_temporal_rules() {
        let fields = vec![
            FieldDescriptor::new("area", FieldType::Float).with_label("Area"),
            FieldDescriptor::new("visit", FieldType::Date).with_label("Visit"),
            FieldDescriptor::new("at", FieldType::Time).with_label("At"),
        ];
        let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
        let report = schema.validate(
            &Record::new()
                .with("area", "12a")
                .with("visit", "15/01/2025")
                .with("at", "10:30:00.000000"),
        );
        assert_eq!(report.error("area"), Some("Area must be a number"));
        assert_eq!(report.error("visit"), Some("Visit must be a date (YYYY-MM-DD)"));
        assert!(report.error("at").is_none());

        let ok = schema.validate(&Record::new().with("area", "1,250.50").with("visit", "2025-01-16"));
        assert!(ok.is_valid());
    }

    #[test]
    fn option_policy_warns_or_rejects() {
        let fields = vec![FieldDescriptor::new("customer", FieldType::Link)
            .with_label("Customer")
            .with_options_list(vec![OptionItem::new("Asha", "CUST-1")])];
        let record = Record::new().with("customer", "CUST-9");

        let warn = SchemaBuilder::new().build(Some(fields.as_slice())).validate(&record);
        assert!(warn.is_valid());
        assert!(warn.warning("customer").is_some());

        let reject = SchemaBuilder::with_options(SchemaOptions::default().with_option_policy(OptionPolicy::Reject))
            .build(Some(fields.as_slice()))
            .validate(&record);
        assert_eq!(
            reject.error("customer"),
            Some("Customer must be one of the available options")
        );
    }

    #[test]
    fn table_policy() {
        let fields = vec![FieldDescriptor::new("docs", FieldType::Table)
            .with_label("Documents")
            .required()
            .with_sub_fields(vec![FieldDescriptor::new("file", FieldType::Attach)])];
        let record = Record::new().with("docs", json!([]));

        let strict = SchemaBuilder::new().build(Some(fields.as_slice())).validate(&record);
        assert_eq!(strict.error("docs"), Some("Documents is required"));

        let lax = SchemaBuilder::with_options(
            SchemaOptions::default().with_table_required(TableRequiredPolicy::Unconstrained),
        )
        .build(Some(fields.as_slice()))
        .validate(&record);
        assert!(lax.is_valid());
    }

    #[test]
    fn last_name_is_always_required() {
        let fields = vec![FieldDescriptor::new("last_name", FieldType::Data).with_label("Last Name")];
        let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
        assert!(schema.rule("last_name").unwrap().required);
        assert!(!fields[0].required);
    }

    #[test]
    fn exclude_and_extra_required() {
        let fields = vec![
            FieldDescriptor::new("status", FieldType::Select).required(),
            FieldDescriptor::new("mobile_no", FieldType::Data).with_label("Mobile No"),
        ];
        let options = SchemaOptions::default()
            .exclude(["status"])
            .extra_required(["mobile_no"]);
        let schema = SchemaBuilder::with_options(options).build(Some(fields.as_slice()));
        assert!(!schema.contains("status"));
        let report = schema.validate(&Record::new());
        assert_eq!(report.error("mobile_no"), Some("Mobile No is required"));
    }

    #[test]
    fn empty_rich_text_counts_as_empty() {
        let fields = vec![FieldDescriptor::new("notes", FieldType::TextEditor)
            .with_label("Notes")
            .required()];
        let schema = SchemaBuilder::new().build(Some(fields.as_slice()));
        let report = schema.validate(&Record::new().with("notes", "<p></p>"));
        assert_eq!(report.error("notes"), Some("Notes is required"));
    }
}
