//! Testing utilities for the doctype workspace
//!
//! Descriptor fixtures shaped like the backend's doctypes and, with the
//! `api` feature, an in-memory backend.

#![allow(missing_docs)]

use doctype_meta::{DoctypeInfo, FieldDescriptor, FieldType, Record};
use serde_json::json;

#[cfg(feature = "api")]
mod memory;

#[cfg(feature = "api")]
pub use memory::InMemoryDoctypeApi;

pub const PLOT_DETAIL: &str = "Plot Detail";
pub const LEAD: &str = "Lead";
pub const CUSTOMER: &str = "Customer";

/// `plot_no` (required Data) and `plot_status` (Select New/Booked/Sold)
pub fn plot_detail_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("plot_no", FieldType::Data)
            .with_label("Plot No")
            .required(),
        FieldDescriptor::new("plot_status", FieldType::Select)
            .with_label("Plot Status")
            .with_options("New\nBooked\nSold"),
    ]
}

pub fn plot_detail_info() -> DoctypeInfo {
    DoctypeInfo::new(plot_detail_descriptors())
}

pub fn plot_record(plot_no: &str, status: &str) -> Record {
    Record::new().with("plot_no", plot_no).with("plot_status", status)
}

/// Documents child table: type, file, a layout break and remarks
pub fn documents_table() -> FieldDescriptor {
    FieldDescriptor::new("documents", FieldType::Table)
        .with_label("Documents")
        .with_options("Lead Document")
        .with_sub_fields(vec![
            FieldDescriptor::new("document_type", FieldType::Select)
                .with_label("Document Type")
                .with_options("Aadhaar\nPAN\nSale Deed")
                .required(),
            FieldDescriptor::new("document", FieldType::Attach).with_label("Document"),
            FieldDescriptor::new("sb_1", FieldType::SectionBreak),
            FieldDescriptor::new("remarks", FieldType::SmallText).with_label("Remarks"),
        ])
}

/// Lead form: names, phone, status, links, a date, money and documents
pub fn lead_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("first_name", FieldType::Data).with_label("First Name"),
        FieldDescriptor::new("last_name", FieldType::Data).with_label("Last Name"),
        FieldDescriptor::new("mobile_no", FieldType::Data).with_label("Mobile No"),
        FieldDescriptor::new("cb_1", FieldType::ColumnBreak),
        FieldDescriptor::new("status", FieldType::Select)
            .with_label("Status")
            .with_options("Open\nReplied\nConverted\nLost")
            .with_default(json!("Open")),
        FieldDescriptor::new("customer", FieldType::Link)
            .with_label("Customer")
            .with_options(CUSTOMER),
        FieldDescriptor::new("party_type", FieldType::Link)
            .with_label("Party Type")
            .with_options("DocType")
            .without_create(),
        FieldDescriptor::new("party", FieldType::DynamicLink)
            .with_label("Party")
            .with_options("party_type"),
        FieldDescriptor::new("follow_up_date", FieldType::Date).with_label("Follow Up Date"),
        FieldDescriptor::new("budget", FieldType::Currency).with_label("Budget"),
        FieldDescriptor::new("sb_1", FieldType::SectionBreak),
        documents_table(),
    ]
}

pub fn lead_info() -> DoctypeInfo {
    DoctypeInfo::new(lead_descriptors())
}

pub fn customer_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("customer_name", FieldType::Data)
            .with_label("Customer Name")
            .required(),
    ]
}

pub fn customer_info() -> DoctypeInfo {
    DoctypeInfo::new(customer_descriptors())
}
