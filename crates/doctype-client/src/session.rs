//! Form session
//!
//! The create/edit page flow for one doctype: fetch descriptors, build the
//! schema, fetch the record when editing, populate the form, then submit,
//! delete or create linked records against the backend. After every
//! successful mutation the record is fetched again; local state is never
//! treated as authoritative.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use doctype_form::{
    ControlEvent, DynamicForm, FormState, RenderedField, SchemaBuilder, SchemaOptions, ValidationSchema,
};
use doctype_meta::{DoctypeInfo, FieldType, Record};

use crate::api::DoctypeApi;
use crate::error::{ClientError, SessionError};
use crate::notify::{Notifier, TracingNotifier};

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Whether the session creates a new record or edits an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// New record
    Create,
    /// Existing record by id
    Edit(String),
}

/// Loading state of the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Descriptors or record not fetched yet
    Loading,
    /// Form can be rendered and edited
    Ready,
    /// A fetch failed; the message is the one shown to the user
    Failed(String),
}

/// One create/edit form bound to a backend doctype
pub struct FormSession<A> {
    api: A,
    doctype: String,
    fields: Vec<String>,
    mode: SessionMode,
    status: SessionStatus,
    info: Option<DoctypeInfo>,
    schema_options: SchemaOptions,
    schema: ValidationSchema,
    form: DynamicForm,
    state: Option<FormState>,
    notifier: Arc<dyn Notifier>,
}

impl<A: DoctypeApi> FormSession<A> {
    /// Session creating a new record
    #[must_use]
    pub fn new(api: A, doctype: impl Into<String>) -> Self {
        Self {
            api,
            doctype: doctype.into(),
            fields: Vec::new(),
            mode: SessionMode::Create,
            status: SessionStatus::Loading,
            info: None,
            schema_options: SchemaOptions::default(),
            schema: ValidationSchema::default(),
            form: DynamicForm::default(),
            state: None,
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Edit an existing record instead
    #[inline]
    #[must_use]
    pub fn editing(mut self, id: impl Into<String>) -> Self {
        self.mode = SessionMode::Edit(id.into());
        self
    }

    /// Restrict fetched descriptors to these fields
    #[must_use]
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Schema builder options
    #[inline]
    #[must_use]
    pub fn with_schema_options(mut self, options: SchemaOptions) -> Self {
        self.schema_options = options;
        self
    }

    /// Form used for rendering
    #[inline]
    #[must_use]
    pub fn with_form(mut self, form: DynamicForm) -> Self {
        self.form = form;
        self
    }

    /// Where notifications go
    #[inline]
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Doctype of this session
    #[inline]
    #[must_use]
    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    /// Create or edit
    #[inline]
    #[must_use]
    pub fn mode(&self) -> &SessionMode {
        &self.mode
    }

    /// Loading state
    #[inline]
    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Fetched descriptors
    #[inline]
    #[must_use]
    pub fn info(&self) -> Option<&DoctypeInfo> {
        self.info.as_ref()
    }

    /// Schema built from the descriptors
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &ValidationSchema {
        &self.schema
    }

    /// Form state, once loaded
    #[inline]
    #[must_use]
    pub fn state(&self) -> Option<&FormState> {
        self.state.as_ref()
    }

    /// Mutable form state, for sub-table editing
    #[inline]
    pub fn state_mut(&mut self) -> Option<&mut FormState> {
        self.state.as_mut()
    }

    /// The API this session talks to
    #[inline]
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch descriptors (and the record when editing) and populate the form
    ///
    /// A failed fetch leaves the session in [`SessionStatus::Failed`] and is
    /// reported through the notifier.
    ///
    /// # Errors
    /// `SessionError::Client` when a fetch fails.
    pub async fn load(&mut self) -> Result<()> {
        self.status = SessionStatus::Loading;
        match self.fetch_form().await {
            Ok(()) => {
                self.status = SessionStatus::Ready;
                if let Err(e) = self.refresh_dynamic_links().await {
                    tracing::warn!("Dynamic link options for {} not resolved: {}", self.doctype, e);
                }
                Ok(())
            }
            Err(e) => {
                let message = e.user_message();
                tracing::error!("Loading {} failed: {}", self.doctype, message);
                self.notifier.error(&message);
                self.status = SessionStatus::Failed(message);
                Err(e.into())
            }
        }
    }

    async fn fetch_form(&mut self) -> std::result::Result<(), ClientError> {
        let info = self.api.list_info(&self.doctype, &self.fields).await?;
        let state = match &self.mode {
            SessionMode::Create => FormState::new(&info.fields),
            SessionMode::Edit(id) => {
                let record = self.api.single_data(&self.doctype, id).await?;
                FormState::from_record(&info.fields, &record)
            }
        };
        self.install_info(info);
        self.state = Some(state);
        Ok(())
    }

    fn install_info(&mut self, info: DoctypeInfo) {
        self.schema = SchemaBuilder::with_options(self.schema_options.clone()).build(Some(info.fields.as_slice()));
        self.info = Some(info);
    }

    /// Render the requested fields in order
    ///
    /// Renders nothing until the session is loaded.
    #[must_use]
    pub fn render<S: AsRef<str>>(&self, requested: Option<&[S]>) -> Vec<RenderedField> {
        let Some(state) = &self.state else {
            tracing::debug!("{} form not loaded, rendering nothing", self.doctype);
            return Vec::new();
        };
        self.form
            .render(self.info.as_ref().map(|i| i.fields.as_slice()), requested, state)
    }

    /// Render every field in backend order
    #[must_use]
    pub fn render_all(&self) -> Vec<RenderedField> {
        match (&self.info, &self.state) {
            (Some(info), Some(state)) => self.form.render_all(&info.fields, state),
            _ => Vec::new(),
        }
    }

    /// Set a field value and re-resolve dependent Dynamic Links
    ///
    /// # Errors
    /// - `SessionError::NotReady` before [`load`](Self::load) succeeded
    /// - `SessionError::Client` if option resolution fails
    pub async fn set(&mut self, fieldname: &str, value: JsonValue) -> Result<()> {
        self.ready_state()?.set(fieldname, value);
        self.refresh_dynamic_links().await
    }

    /// Apply a control event and re-resolve dependent Dynamic Links
    ///
    /// # Errors
    /// - `SessionError::NotReady` before [`load`](Self::load) succeeded
    /// - `SessionError::Form` if the event is rejected
    /// - `SessionError::Client` if option resolution fails
    pub async fn apply_event(&mut self, fieldname: &str, event: ControlEvent) -> Result<()> {
        let renderer = self.form.renderer().clone();
        self.ready_state()?.apply_event(&renderer, fieldname, event)?;
        self.refresh_dynamic_links().await
    }

    /// Restore the values the form was loaded with
    pub fn reset(&mut self) {
        if let Some(state) = &mut self.state {
            state.reset();
        }
    }

    /// Resolve option lists of Dynamic Links whose target changed
    ///
    /// # Errors
    /// `SessionError::Client` on the first failed lookup; links already
    /// resolved keep their options.
    pub async fn refresh_dynamic_links(&mut self) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        for (fieldname, doctype) in state.stale_links() {
            let options = self.api.link_options(&doctype).await?;
            tracing::debug!("Resolved {} options of {} for {}", options.len(), doctype, fieldname);
            if let Some(state) = &mut self.state {
                state.resolve_link(&fieldname, options);
            }
        }
        Ok(())
    }

    /// Validate and send the form
    ///
    /// Validation errors block the remote call. A failed call is reported
    /// through the notifier and leaves the form state as it was. On success
    /// the record is fetched again and a created record switches the session
    /// to edit mode. Failures after the mutation succeeded are logged, not
    /// returned.
    ///
    /// # Errors
    /// - `SessionError::NotReady` before [`load`](Self::load) succeeded
    /// - `SessionError::Invalid` with the validation report
    /// - `SessionError::Client` if the create or update fails
    pub async fn submit(&mut self) -> Result<Record> {
        let schema = &self.schema;
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| SessionError::NotReady(self.doctype.clone()))?;
        let record = state.submit(schema).map_err(|report| {
            tracing::debug!("{} form blocked: {}", self.doctype, report);
            SessionError::Invalid(report)
        })?;

        let sent = match &self.mode {
            SessionMode::Create => self.api.create(&self.doctype, &record).await,
            SessionMode::Edit(id) => self.api.update(&self.doctype, id, &record).await,
        };
        let stored = match sent {
            Ok(stored) => stored,
            Err(e) => {
                self.notifier.error(&e.user_message());
                return Err(e.into());
            }
        };

        let id = stored.id().map(str::to_string).or_else(|| match &self.mode {
            SessionMode::Edit(id) => Some(id.clone()),
            SessionMode::Create => None,
        });
        self.notifier.success(&match self.mode {
            SessionMode::Create => format!("{} created", self.doctype),
            SessionMode::Edit(_) => format!("{} updated", self.doctype),
        });

        let Some(id) = id else {
            tracing::warn!("{} create returned no id, keeping local values", self.doctype);
            if let Some(state) = &mut self.state {
                state.mark_saved(&stored);
            }
            return Ok(stored);
        };
        self.mode = SessionMode::Edit(id.clone());

        match self.api.single_data(&self.doctype, &id).await {
            Ok(fresh) if !fresh.is_empty() => {
                if let Some(info) = &self.info {
                    self.state = Some(FormState::from_record(&info.fields, &fresh));
                }
                if let Err(e) = self.refresh_dynamic_links().await {
                    tracing::warn!("Refreshing {} link options failed: {}", self.doctype, e);
                }
                Ok(fresh)
            }
            Ok(_) => {
                if let Some(state) = &mut self.state {
                    state.mark_saved(&stored);
                }
                Ok(stored)
            }
            Err(e) => {
                tracing::warn!("Refetching {} {} failed: {}", self.doctype, id, e);
                if let Some(state) = &mut self.state {
                    state.mark_saved(&stored);
                }
                Ok(stored)
            }
        }
    }

    /// Delete the record being edited; the session returns to create mode
    ///
    /// # Errors
    /// - `SessionError::NoRecord` in create mode
    /// - `SessionError::Client` if the delete fails
    pub async fn delete(&mut self) -> Result<()> {
        let SessionMode::Edit(id) = &self.mode else {
            return Err(SessionError::NoRecord);
        };
        if let Err(e) = self.api.delete(&self.doctype, std::slice::from_ref(id)).await {
            self.notifier.error(&e.user_message());
            return Err(e.into());
        }
        self.notifier.success(&format!("{} deleted", self.doctype));
        self.mode = SessionMode::Create;
        self.state = self.info.as_ref().map(|info| FormState::new(&info.fields));
        Ok(())
    }

    /// Create a record in a Link field's target doctype and select it
    ///
    /// The descriptors are fetched again so the Link's option list includes
    /// the new record. A failed refetch is logged; the new value is still
    /// selected.
    ///
    /// # Errors
    /// - `SessionError::NotReady` before [`load`](Self::load) succeeded
    /// - `SessionError::CreateNotAllowed` if the field is not a creatable Link
    /// - `SessionError::Client` if the create fails or returns no id
    pub async fn create_linked_record(&mut self, fieldname: &str, record: &Record) -> Result<Record> {
        let target = {
            let state = self.ready_state()?;
            let descriptor = state
                .descriptor(fieldname)
                .filter(|d| d.fieldtype == FieldType::Link && d.allow_create)
                .ok_or_else(|| SessionError::CreateNotAllowed(fieldname.to_string()))?;
            descriptor
                .link_target()
                .ok_or_else(|| SessionError::CreateNotAllowed(fieldname.to_string()))?
                .to_string()
        };

        let created = match self.api.create(&target, record).await {
            Ok(created) => created,
            Err(e) => {
                self.notifier.error(&e.user_message());
                return Err(e.into());
            }
        };
        let Some(id) = created.id().map(str::to_string) else {
            let e = ClientError::MissingId;
            self.notifier.error(&e.user_message());
            return Err(e.into());
        };
        tracing::info!("Created {} {} from {}.{}", target, id, self.doctype, fieldname);

        self.api.invalidate_info(&self.doctype).await;
        match self.api.list_info(&self.doctype, &self.fields).await {
            Ok(info) => {
                if let Some(state) = &mut self.state {
                    state.refresh_descriptors(&info.fields);
                }
                self.install_info(info);
            }
            Err(e) => tracing::warn!("Refreshing {} descriptors failed: {}", self.doctype, e),
        }
        if let Some(state) = &mut self.state {
            state.set(fieldname, JsonValue::String(id));
        }
        self.notifier.success(&format!("{target} created"));
        Ok(created)
    }

    fn ready_state(&mut self) -> Result<&mut FormState> {
        match (&self.status, self.state.as_mut()) {
            (SessionStatus::Ready, Some(state)) => Ok(state),
            _ => Err(SessionError::NotReady(self.doctype.clone())),
        }
    }
}

impl<A> std::fmt::Debug for FormSession<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("doctype", &self.doctype)
            .field("mode", &self.mode)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
