//! List queries
//!
//! Filters are `[fieldname, operator, value]` triples, ANDed together by the
//! backend. They travel as JSON-encoded query parameters.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::MetaError;
use crate::record::Record;

/// Default page length of a list query
pub const DEFAULT_PAGE_LENGTH: u32 = 10;

/// Default ordering of a list query
pub const DEFAULT_ORDER_BY: &str = "modified desc";

/// Filter comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `in`
    In,
}

impl FilterOp {
    /// Wire representation
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::In => "in",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            "in" | "IN" => Ok(Self::In),
            other => Err(MetaError::UnknownOperator(other.to_string())),
        }
    }
}

/// One `[fieldname, operator, value]` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field to compare
    pub fieldname: String,
    /// Comparison
    pub op: FilterOp,
    /// Right-hand side (an array for `in`)
    pub value: JsonValue,
}

impl Filter {
    /// `fieldname = value`
    #[must_use]
    pub fn equals(fieldname: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            fieldname: fieldname.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    /// `fieldname != value`
    #[must_use]
    pub fn not_equals(fieldname: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            fieldname: fieldname.into(),
            op: FilterOp::Ne,
            value: value.into(),
        }
    }

    /// `fieldname in values`
    #[must_use]
    pub fn is_in<I, V>(fieldname: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<JsonValue>,
    {
        Self {
            fieldname: fieldname.into(),
            op: FilterOp::In,
            value: JsonValue::Array(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Evaluate against a record, the way the backend would
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.fieldname).unwrap_or(&JsonValue::Null);
        match self.op {
            FilterOp::Eq => loose_eq(actual, &self.value),
            FilterOp::Ne => !loose_eq(actual, &self.value),
            FilterOp::In => match &self.value {
                JsonValue::Array(items) => items.iter().any(|v| loose_eq(actual, v)),
                single => loose_eq(actual, single),
            },
        }
    }

    /// Parse the CLI shorthand `field=value`, `field!=value`, `field in a,b`
    ///
    /// # Errors
    /// `MetaError::InvalidFilter` if no operator is found
    pub fn parse_expr(expr: &str) -> Result<Self, MetaError> {
        if let Some((field, values)) = expr.split_once(" in ") {
            let values = values
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| JsonValue::String(v.to_string()));
            return Ok(Self::is_in(field.trim(), values));
        }
        if let Some((field, value)) = expr.split_once("!=") {
            return Ok(Self::not_equals(field.trim(), value.trim()));
        }
        if let Some((field, value)) = expr.split_once('=') {
            return Ok(Self::equals(field.trim(), value.trim()));
        }
        Err(MetaError::InvalidFilter(expr.to_string()))
    }
}

fn loose_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::String(x), JsonValue::Number(n)) | (JsonValue::Number(n), JsonValue::String(x)) => {
            x.trim().parse::<f64>().ok() == n.as_f64()
        }
        _ => a == b,
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.fieldname)?;
        seq.serialize_element(self.op.as_str())?;
        seq.serialize_element(&self.value)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TripleVisitor;

        impl<'de> Visitor<'de> for TripleVisitor {
            type Value = Filter;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a [fieldname, operator, value] triple")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Filter, A::Error> {
                let fieldname: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let op: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let value: JsonValue = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let op = op.parse().map_err(de::Error::custom)?;
                Ok(Filter { fieldname, op, value })
            }
        }

        deserializer.deserialize_seq(TripleVisitor)
    }
}

/// Paginated, filtered list request for one doctype
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListQuery {
    /// Doctype to query
    pub doctype: String,
    /// Fields to return (empty = backend default)
    pub fields: Vec<String>,
    /// ANDed conditions
    pub filters: Vec<Filter>,
    /// ORed conditions
    pub or_filters: Vec<Filter>,
    /// 1-based page number
    pub page: u32,
    /// Rows per page
    pub page_length: u32,
    /// Ordering clause
    pub order_by: String,
}

impl ListQuery {
    /// Query first page of a doctype
    #[must_use]
    pub fn new(doctype: impl Into<String>) -> Self {
        Self {
            doctype: doctype.into(),
            fields: Vec::new(),
            filters: Vec::new(),
            or_filters: Vec::new(),
            page: 1,
            page_length: DEFAULT_PAGE_LENGTH,
            order_by: DEFAULT_ORDER_BY.to_string(),
        }
    }

    /// With returned fields
    #[inline]
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add an ANDed condition
    #[inline]
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Add an ORed condition
    #[inline]
    #[must_use]
    pub fn or_filter(mut self, filter: Filter) -> Self {
        self.or_filters.push(filter);
        self
    }

    /// With page number (clamped to 1)
    #[inline]
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// With page length (clamped to 1)
    #[inline]
    #[must_use]
    pub fn page_length(mut self, page_length: u32) -> Self {
        self.page_length = page_length.max(1);
        self
    }

    /// With ordering
    #[inline]
    #[must_use]
    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self
    }

    /// Offset of the first row of the requested page
    #[inline]
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_length as usize
    }

    /// Whether a record satisfies every filter and at least one or-filter
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.filters.iter().all(|f| f.matches(record))
            && (self.or_filters.is_empty() || self.or_filters.iter().any(|f| f.matches(record)))
    }
}

/// One page of list results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    /// Total matching rows across all pages
    #[serde(rename = "counts", alias = "count", alias = "total", default)]
    pub total: u64,
    /// Rows of this page
    #[serde(rename = "data", default)]
    pub rows: Vec<Record>,
}

impl ListPage {
    /// Number of pages for a page length
    #[inline]
    #[must_use]
    pub fn page_count(&self, page_length: u32) -> u64 {
        let len = u64::from(page_length.max(1));
        self.total.div_ceil(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn filters_serialize_as_triples() {
        let filters = vec![
            Filter::equals("status", "Open"),
            Filter::not_equals("owner", "Guest"),
            Filter::is_in("plot_status", ["New", "Booked"]),
        ];
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(
            json,
            json!([
                ["status", "=", "Open"],
                ["owner", "!=", "Guest"],
                ["plot_status", "in", ["New", "Booked"]]
            ])
        );
        let back: Vec<Filter> = serde_json::from_value(json).unwrap();
        assert_eq!(back, filters);
    }

    #[test]
    fn rejects_unknown_operator() {
        let parsed: Result<Filter, _> = serde_json::from_value(json!(["a", "like", "%x%"]));
        assert!(parsed.is_err());
    }

    #[test]
    fn parse_expr_shorthand() {
        assert_eq!(Filter::parse_expr("status=Open").unwrap(), Filter::equals("status", "Open"));
        assert_eq!(Filter::parse_expr("status != Lost").unwrap(), Filter::not_equals("status", "Lost"));
        assert_eq!(
            Filter::parse_expr("plot_status in New,Sold").unwrap(),
            Filter::is_in("plot_status", ["New", "Sold"])
        );
        assert!(Filter::parse_expr("nonsense").is_err());
    }

    #[test]
    fn query_matching_ands_filters_and_ors_or_filters() {
        let q = ListQuery::new("Lead")
            .filter(Filter::equals("status", "Open"))
            .or_filter(Filter::equals("source", "Web"))
            .or_filter(Filter::equals("source", "Walk-in"));

        let hit = Record::new().with("status", "Open").with("source", "Web");
        let wrong_source = Record::new().with("status", "Open").with("source", "Ads");
        let wrong_status = Record::new().with("status", "Lost").with("source", "Web");
        assert!(q.matches(&hit));
        assert!(!q.matches(&wrong_source));
        assert!(!q.matches(&wrong_status));
    }

    #[test]
    fn numeric_strings_compare_loosely() {
        let rec = Record::new().with("year", "2024");
        assert!(Filter::equals("year", 2024).matches(&rec));
    }

    #[test]
    fn paging() {
        let q = ListQuery::new("Lead").page(3).page_length(20);
        assert_eq!(q.offset(), 40);
        assert_eq!(ListQuery::new("Lead").page(0).page, 1);

        let page = ListPage { total: 41, rows: vec![] };
        assert_eq!(page.page_count(20), 3);
    }

    proptest::proptest! {
        #[test]
        fn page_count_covers_every_row(total in 0u64..100_000, len in 0u32..500) {
            let pages = ListPage { total, rows: vec![] }.page_count(len);
            let len = u64::from(len.max(1));
            proptest::prop_assert!(pages * len >= total);
            proptest::prop_assert!(total == 0 || (pages - 1) * len < total);
        }

        #[test]
        fn equality_shorthand_keeps_field_and_value(
            field in "[a-z][a-z_]{0,15}",
            value in "[A-Za-z0-9][A-Za-z0-9-]{0,15}",
        ) {
            let parsed = Filter::parse_expr(&format!("{field} = {value}")).unwrap();
            proptest::prop_assert_eq!(parsed, Filter::equals(field, value));
        }
    }
}
