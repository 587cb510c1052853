//! Doctype backend client
//!
//! Async access to a doctype-style REST backend and the page flows built on
//! it.
//!
//! # Components
//!
//! - **DoctypeApi**: metadata and CRUD calls, implemented over HTTP by
//!   [`HttpDoctypeClient`]
//! - **CachedDoctypeApi**: serves descriptor lists from a moka cache
//! - **FormSession**: fetch descriptors and record, edit, submit, delete
//! - **EntityList**: filtered, paginated listing with bulk delete
//! - **Preferences**: persisted sales/purchase/legal selector
//!
//! # Example
//!
//! ```rust,no_run
//! use doctype_client::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load("doctype.toml")?;
//! let api = HttpDoctypeClient::new(&config)?;
//!
//! let mut session = FormSession::new(api, "Plot Detail");
//! session.load().await?;
//! session.set("plot_no", json!("P-101")).await?;
//! let saved = session.submit().await?;
//! println!("saved {:?}", saved.id());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod listing;
pub mod notify;
pub mod preferences;
pub mod session;

// Re-exports for convenience
pub use api::{DoctypeApi, LINK_OPTIONS_PAGE_LENGTH};
pub use cache::{CachedDoctypeApi, InfoCache, InfoKey};
pub use config::ClientConfig;
pub use error::{server_message, ClientError, Result, SessionError};
pub use http::HttpDoctypeClient;
pub use listing::EntityList;
pub use notify::{Notice, Notifier, RecordingNotifier, TracingNotifier};
pub use preferences::{Preferences, SalesPurchaseType, SALES_PURCHASE_TYPE_KEY};
pub use session::{FormSession, SessionMode, SessionStatus};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for talking to a doctype backend
    pub use crate::api::DoctypeApi;
    pub use crate::cache::{CachedDoctypeApi, InfoCache};
    pub use crate::config::ClientConfig;
    pub use crate::error::{ClientError, SessionError};
    pub use crate::http::HttpDoctypeClient;
    pub use crate::listing::EntityList;
    pub use crate::notify::{Notifier, TracingNotifier};
    pub use crate::session::{FormSession, SessionMode, SessionStatus};
}
