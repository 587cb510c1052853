//! Field type tags
//!
//! The backend describes every field with a string tag (`"Data"`,
//! `"Dynamic Link"`, `"Table MultiSelect"`, ...). `FieldType` is the closed
//! set of tags the form engine knows how to render, plus `Other` which keeps
//! unknown tags verbatim so they can be surfaced instead of dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field type tag of a field descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Single-line text
    Data,
    /// Integer number
    Int,
    /// Decimal number
    Float,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Date and time
    Datetime,
    /// Closed list of newline-delimited choices
    Select,
    /// Reference to a record of another doctype
    Link,
    /// Reference whose target doctype is read from another field
    DynamicLink,
    /// Embedded list of child records
    Table,
    /// Multi-select over a fixed option list
    TableMultiSelect,
    /// Boolean toggle
    Check,
    /// Text
    Text,
    /// Short multi-line text
    SmallText,
    /// Long multi-line text
    LongText,
    /// Rich text editor
    TextEditor,
    /// Raw HTML content
    Html,
    /// File attachment
    Attach,
    /// Image attachment
    AttachImage,
    /// Color swatch
    Color,
    /// Money amount
    Currency,
    /// Percentage
    Percent,
    /// Duration in seconds
    Duration,
    /// Free text with suggestions
    Autocomplete,
    /// Non-editable display
    ReadOnly,
    /// Action button
    Button,
    /// Layout: section separator
    SectionBreak,
    /// Layout: column separator
    ColumnBreak,
    /// Layout: tab separator
    TabBreak,
    /// Any tag the engine does not know
    Other(String),
}

impl FieldType {
    /// Backend tag for this type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Data => "Data",
            Self::Int => "Int",
            Self::Float => "Float",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Datetime => "Datetime",
            Self::Select => "Select",
            Self::Link => "Link",
            Self::DynamicLink => "Dynamic Link",
            Self::Table => "Table",
            Self::TableMultiSelect => "Table MultiSelect",
            Self::Check => "Check",
            Self::Text => "Text",
            Self::SmallText => "Small Text",
            Self::LongText => "Long Text",
            Self::TextEditor => "Text Editor",
            Self::Html => "HTML",
            Self::Attach => "Attach",
            Self::AttachImage => "Attach Image",
            Self::Color => "Color",
            Self::Currency => "Currency",
            Self::Percent => "Percent",
            Self::Duration => "Duration",
            Self::Autocomplete => "Autocomplete",
            Self::ReadOnly => "Read Only",
            Self::Button => "Button",
            Self::SectionBreak => "Section Break",
            Self::ColumnBreak => "Column Break",
            Self::TabBreak => "Tab Break",
            Self::Other(tag) => tag,
        }
    }

    /// Pure layout marker: renders nothing
    #[inline]
    #[must_use]
    pub fn is_layout(&self) -> bool {
        matches!(self, Self::SectionBreak | Self::ColumnBreak | Self::TabBreak)
    }

    /// Carries no validated value (layout markers, buttons, read-only displays)
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.is_layout() || matches!(self, Self::Button | Self::ReadOnly)
    }

    /// Value must parse as a number
    #[inline]
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int | Self::Float | Self::Currency | Self::Percent | Self::Duration
        )
    }

    /// Date, Time or Datetime
    #[inline]
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Datetime)
    }

    /// Value is picked from an option list
    #[inline]
    #[must_use]
    pub fn is_choice(&self) -> bool {
        matches!(self, Self::Select | Self::Link | Self::DynamicLink)
    }

    /// Value is an array
    #[inline]
    #[must_use]
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, Self::Table | Self::TableMultiSelect)
    }

    /// Engine has a dedicated control for this type
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for FieldType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Data" => Self::Data,
            "Int" => Self::Int,
            "Float" => Self::Float,
            "Date" => Self::Date,
            "Time" => Self::Time,
            "Datetime" => Self::Datetime,
            "Select" => Self::Select,
            "Link" => Self::Link,
            "Dynamic Link" => Self::DynamicLink,
            "Table" => Self::Table,
            "Table MultiSelect" => Self::TableMultiSelect,
            "Check" => Self::Check,
            "Text" => Self::Text,
            "Small Text" => Self::SmallText,
            "Long Text" => Self::LongText,
            "Text Editor" => Self::TextEditor,
            "HTML" => Self::Html,
            "Attach" => Self::Attach,
            "Attach Image" => Self::AttachImage,
            "Color" => Self::Color,
            "Currency" => Self::Currency,
            "Percent" => Self::Percent,
            "Duration" => Self::Duration,
            "Autocomplete" => Self::Autocomplete,
            "Read Only" => Self::ReadOnly,
            "Button" => Self::Button,
            "Section Break" => Self::SectionBreak,
            "Column Break" => Self::ColumnBreak,
            "Tab Break" => Self::TabBreak,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        match tag.parse() {
            Ok(ty) => Ok(ty),
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_tags() {
        assert_eq!("Dynamic Link".parse::<FieldType>().unwrap(), FieldType::DynamicLink);
        assert_eq!(
            "Table MultiSelect".parse::<FieldType>().unwrap(),
            FieldType::TableMultiSelect
        );
        assert_eq!("Read Only".parse::<FieldType>().unwrap(), FieldType::ReadOnly);
    }

    #[test]
    fn unknown_tag_is_preserved() {
        let ty: FieldType = "Geolocation".parse().unwrap();
        assert_eq!(ty, FieldType::Other("Geolocation".into()));
        assert_eq!(ty.to_string(), "Geolocation");
        assert!(!ty.is_known());
    }

    #[test]
    fn serde_uses_backend_tags() {
        let json = serde_json::to_string(&FieldType::AttachImage).unwrap();
        assert_eq!(json, "\"Attach Image\"");
        let back: FieldType = serde_json::from_str("\"Section Break\"").unwrap();
        assert_eq!(back, FieldType::SectionBreak);
    }

    #[test]
    fn classification() {
        assert!(FieldType::ColumnBreak.is_layout());
        assert!(FieldType::Button.is_structural());
        assert!(FieldType::ReadOnly.is_structural());
        assert!(!FieldType::Button.is_layout());
        assert!(FieldType::Currency.is_numeric());
        assert!(FieldType::Datetime.is_temporal());
        assert!(FieldType::DynamicLink.is_choice());
        assert!(FieldType::Table.is_multi_valued());
        assert!(!FieldType::Data.is_structural());
    }
}
