//! Paginated entity listing
//!
//! The list view of one doctype: filters, paging and bulk delete. The
//! backend stays the source of truth, so every mutation is followed by a
//! refetch of the current page.

use std::sync::Arc;

use doctype_meta::{Filter, ListPage, ListQuery, Record};

use crate::api::DoctypeApi;
use crate::error::Result;
use crate::notify::{Notifier, TracingNotifier};

/// Filtered, paginated view of one doctype
pub struct EntityList<A> {
    api: A,
    notifier: Arc<dyn Notifier>,
    query: ListQuery,
    page: ListPage,
}

impl<A: DoctypeApi> EntityList<A> {
    /// Listing of a doctype, first page, nothing fetched yet
    #[must_use]
    pub fn new(api: A, doctype: impl Into<String>) -> Self {
        Self {
            api,
            notifier: Arc::new(TracingNotifier),
            query: ListQuery::new(doctype),
            page: ListPage::default(),
        }
    }

    /// Columns to request
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = self.query.with_fields(fields);
        self
    }

    /// Rows per page
    #[inline]
    #[must_use]
    pub fn with_page_length(mut self, page_length: u32) -> Self {
        self.query = self.query.page_length(page_length);
        self
    }

    /// Ordering clause
    #[inline]
    #[must_use]
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.query = self.query.order_by(order_by);
        self
    }

    /// Where notifications go
    #[inline]
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Current query
    #[inline]
    #[must_use]
    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Rows of the current page
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.page.rows
    }

    /// Total matching rows
    #[inline]
    #[must_use]
    pub fn total(&self) -> u64 {
        self.page.total
    }

    /// Current 1-based page
    #[inline]
    #[must_use]
    pub fn page(&self) -> u32 {
        self.query.page
    }

    /// Number of pages at the current page length
    #[inline]
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.page.page_count(self.query.page_length)
    }

    /// Fetch the current page
    ///
    /// # Errors
    /// The client error; it is also reported through the notifier.
    pub async fn fetch(&mut self) -> Result<&ListPage> {
        match self.api.list_data(&self.query).await {
            Ok(page) => {
                tracing::debug!(
                    "Fetched page {} of {} ({} rows, {} total)",
                    self.query.page,
                    self.query.doctype,
                    page.rows.len(),
                    page.total
                );
                self.page = page;
                Ok(&self.page)
            }
            Err(e) => {
                self.notifier.error(&e.user_message());
                Err(e)
            }
        }
    }

    /// Move to a page (clamped to 1) and fetch it
    ///
    /// # Errors
    /// See [`fetch`](Self::fetch).
    pub async fn goto_page(&mut self, page: u32) -> Result<&ListPage> {
        self.query.page = page.max(1);
        self.fetch().await
    }

    /// Replace the filters, return to the first page and fetch
    ///
    /// # Errors
    /// See [`fetch`](Self::fetch).
    pub async fn set_filters(&mut self, filters: Vec<Filter>, or_filters: Vec<Filter>) -> Result<&ListPage> {
        self.query.filters = filters;
        self.query.or_filters = or_filters;
        self.query.page = 1;
        self.fetch().await
    }

    /// Delete records, then refetch; steps back a page when the current one empties
    ///
    /// # Errors
    /// The client error of the delete or the refetch.
    pub async fn delete(&mut self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.api.delete(&self.query.doctype, ids).await {
            self.notifier.error(&e.user_message());
            return Err(e);
        }
        self.notifier
            .success(&format!("Deleted {} {} record(s)", ids.len(), self.query.doctype));

        self.fetch().await?;
        if self.page.rows.is_empty() && self.query.page > 1 {
            let previous = self.query.page - 1;
            self.goto_page(previous).await?;
        }
        Ok(())
    }
}

impl<A> std::fmt::Debug for EntityList<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityList")
            .field("query", &self.query)
            .field("total", &self.page.total)
            .finish_non_exhaustive()
    }
}
