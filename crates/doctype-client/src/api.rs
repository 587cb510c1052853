//! Backend API abstraction
//!
//! Every page and session talks to the backend through [`DoctypeApi`], so
//! the HTTP client, the cached wrapper and the in-memory fake are
//! interchangeable.

use std::sync::Arc;

use doctype_meta::{DoctypeInfo, ListPage, ListQuery, OptionItem, Record};

use crate::error::Result;

/// Page length used when resolving link options in one request
pub const LINK_OPTIONS_PAGE_LENGTH: u32 = 500;

/// CRUD and metadata calls against a doctype backend
#[async_trait::async_trait]
pub trait DoctypeApi: Send + Sync {
    /// Field descriptors of a doctype, restricted to `fields` when non-empty
    async fn list_info(&self, doctype: &str, fields: &[String]) -> Result<DoctypeInfo>;

    /// One page of records
    async fn list_data(&self, query: &ListQuery) -> Result<ListPage>;

    /// One record by id (empty record when the backend has none)
    async fn single_data(&self, doctype: &str, id: &str) -> Result<Record>;

    /// Create a record, returning the stored record
    async fn create(&self, doctype: &str, record: &Record) -> Result<Record>;

    /// Update a record, returning the stored record
    async fn update(&self, doctype: &str, id: &str, record: &Record) -> Result<Record>;

    /// Delete records by id
    async fn delete(&self, doctype: &str, ids: &[String]) -> Result<()>;

    /// Selectable `{label, value}` pairs of a target doctype
    async fn link_options(&self, doctype: &str) -> Result<Vec<OptionItem>> {
        let query = ListQuery::new(doctype)
            .with_fields(["name"])
            .page_length(LINK_OPTIONS_PAGE_LENGTH);
        let page = self.list_data(&query).await?;
        Ok(page
            .rows
            .iter()
            .filter_map(Record::id)
            .map(OptionItem::plain)
            .collect())
    }

    /// Drop any cached descriptors of a doctype
    async fn invalidate_info(&self, _doctype: &str) {}
}

#[async_trait::async_trait]
impl<T: DoctypeApi + ?Sized> DoctypeApi for Arc<T> {
    async fn list_info(&self, doctype: &str, fields: &[String]) -> Result<DoctypeInfo> {
        (**self).list_info(doctype, fields).await
    }

    async fn list_data(&self, query: &ListQuery) -> Result<ListPage> {
        (**self).list_data(query).await
    }

    async fn single_data(&self, doctype: &str, id: &str) -> Result<Record> {
        (**self).single_data(doctype, id).await
    }

    async fn create(&self, doctype: &str, record: &Record) -> Result<Record> {
        (**self).create(doctype, record).await
    }

    async fn update(&self, doctype: &str, id: &str, record: &Record) -> Result<Record> {
        (**self).update(doctype, id, record).await
    }

    async fn delete(&self, doctype: &str, ids: &[String]) -> Result<()> {
        (**self).delete(doctype, ids).await
    }

    async fn link_options(&self, doctype: &str) -> Result<Vec<OptionItem>> {
        (**self).link_options(doctype).await
    }

    async fn invalidate_info(&self, doctype: &str) {
        (**self).invalidate_info(doctype).await;
    }
}
