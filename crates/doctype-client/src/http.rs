//! HTTP implementation of [`DoctypeApi`]
//!
//! Method calls go to `{host}/api/method/{namespace}.{method}` and resource
//! calls to `{host}/api/resource/{doctype}[/{id}]`. Method responses wrap
//! their payload in `data`; `single_data` nests the record one level deeper.

use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::{json, Value as JsonValue};
use url::Url;

use doctype_meta::{DoctypeInfo, ListPage, ListQuery, Record};

use crate::api::DoctypeApi;
use crate::config::ClientConfig;
use crate::error::{server_message, ClientError, Result};

/// reqwest-backed doctype client
#[derive(Clone)]
pub struct HttpDoctypeClient {
    http: reqwest::Client,
    base: Url,
    namespace: String,
}

impl std::fmt::Debug for HttpDoctypeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDoctypeClient")
            .field("base", &self.base.as_str())
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl HttpDoctypeClient {
    /// Build a client from configuration
    ///
    /// An undecodable token is dropped with a warning and requests go out
    /// unauthenticated.
    ///
    /// # Errors
    /// - `ClientError::Config` if the configuration is invalid
    /// - `ClientError::Transport` if the HTTP client cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let base = api_base(&config.host)?;

        let mut headers = HeaderMap::new();
        if let Some(raw) = config.token.as_deref() {
            match decode_token(raw).and_then(|token| {
                HeaderValue::from_str(&format!("token {token}")).map_err(|e| ClientError::InvalidToken(e.to_string()))
            }) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => tracing::warn!("Discarding auth token: {}", e),
            }
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        tracing::info!("Doctype client for {} (namespace {})", base, config.namespace);
        Ok(Self {
            http,
            base,
            namespace: config.namespace.clone(),
        })
    }

    /// Base URL all calls are relative to
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// URL of a whitelisted method in the configured namespace
    ///
    /// # Errors
    /// `ClientError::Config` if the base URL cannot carry a path.
    pub fn method_url(&self, method: &str) -> Result<Url> {
        let name = format!("{}.{method}", self.namespace);
        extend(&self.base, &["method", &name])
    }

    /// URL of a resource collection or document
    ///
    /// # Errors
    /// `ClientError::Config` if the base URL cannot carry a path.
    pub fn resource_url(&self, doctype: &str, id: Option<&str>) -> Result<Url> {
        match id {
            Some(id) => extend(&self.base, &["resource", doctype, id]),
            None => extend(&self.base, &["resource", doctype]),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<JsonValue> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Option<JsonValue> = serde_json::from_slice(&bytes).ok();

        if !status.is_success() {
            return Err(status_error(status, body));
        }
        body.ok_or_else(|| ClientError::Decode("response is not JSON".into()))
    }

    async fn call(&self, method: Method, url: Url, query: Option<Vec<(&str, String)>>, body: Option<JsonValue>) -> Result<JsonValue> {
        tracing::debug!("{} {}", method, url);
        let mut request = self.http.request(method, url);
        if let Some(query) = query {
            request = request.query(&query);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        self.send(request).await
    }
}

#[async_trait::async_trait]
impl DoctypeApi for HttpDoctypeClient {
    async fn list_info(&self, doctype: &str, fields: &[String]) -> Result<DoctypeInfo> {
        let mut query = vec![("doctype", doctype.to_string())];
        if !fields.is_empty() {
            query.push(("fields", serde_json::to_string(fields)?));
        }
        let body = self.call(Method::GET, self.method_url("list_info")?, Some(query), None).await?;
        let info: DoctypeInfo = serde_json::from_value(unwrap_data(body)?)?;
        if let Err(e) = info.validate() {
            tracing::warn!("Descriptors of {} are inconsistent: {}", doctype, e);
        }
        Ok(info)
    }

    async fn list_data(&self, query: &ListQuery) -> Result<ListPage> {
        let params = list_query_params(query)?;
        let body = self.call(Method::GET, self.method_url("list_data")?, Some(params), None).await?;
        let mut page: ListPage = serde_json::from_value(unwrap_data(body)?)?;
        for row in &mut page.rows {
            if !row.contains("id") {
                if let Some(name) = row.get("name").cloned() {
                    row.insert("id", name);
                }
            }
        }
        Ok(page)
    }

    async fn single_data(&self, doctype: &str, id: &str) -> Result<Record> {
        let query = vec![("doctype", doctype.to_string()), ("id", id.to_string())];
        let body = self.call(Method::GET, self.method_url("single_data")?, Some(query), None).await?;
        let record = match unwrap_data(body)?.get_mut("data").map(JsonValue::take) {
            None | Some(JsonValue::Null) => Record::new(),
            Some(value) => Record::from_json(value).ok_or_else(|| ClientError::Decode("record is not an object".into()))?,
        };
        Ok(record)
    }

    async fn create(&self, doctype: &str, record: &Record) -> Result<Record> {
        let url = self.resource_url(doctype, None)?;
        let body = self.call(Method::POST, url, None, Some(record.clone().into_json())).await?;
        tracing::info!("Created {} record", doctype);
        into_record(unwrap_data(body)?)
    }

    async fn update(&self, doctype: &str, id: &str, record: &Record) -> Result<Record> {
        let url = self.resource_url(doctype, Some(id))?;
        let body = self.call(Method::PUT, url, None, Some(record.clone().into_json())).await?;
        tracing::info!("Updated {} {}", doctype, id);
        into_record(unwrap_data(body)?)
    }

    async fn delete(&self, doctype: &str, ids: &[String]) -> Result<()> {
        let payload = json!({ "doctype": doctype, "ids": ids });
        self.call(Method::POST, self.method_url("delete_data")?, None, Some(payload)).await?;
        tracing::info!("Deleted {} {} record(s)", ids.len(), doctype);
        Ok(())
    }
}

/// `{host}/api/`
fn api_base(host: &str) -> Result<Url> {
    let host = Url::parse(host)?;
    extend(&host, &["api"])
}

fn extend(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ClientError::Config(format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Decode the stored base64 token
///
/// # Errors
/// `ClientError::InvalidToken` when the text is not base64 of UTF-8.
pub fn decode_token(raw: &str) -> Result<String> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| ClientError::InvalidToken(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ClientError::InvalidToken(e.to_string()))
}

/// Query parameters of a list request; collections are JSON encoded
///
/// # Errors
/// `ClientError::Decode` if a filter value cannot be encoded.
pub fn list_query_params(query: &ListQuery) -> Result<Vec<(&'static str, String)>> {
    let mut params = vec![("doctype", query.doctype.clone())];
    if !query.fields.is_empty() {
        params.push(("fields", serde_json::to_string(&query.fields)?));
    }
    if !query.filters.is_empty() {
        params.push(("filters", serde_json::to_string(&query.filters)?));
    }
    if !query.or_filters.is_empty() {
        params.push(("or_filters", serde_json::to_string(&query.or_filters)?));
    }
    params.push(("page", query.page.to_string()));
    params.push(("page_length", query.page_length.to_string()));
    params.push(("order_by", query.order_by.clone()));
    Ok(params)
}

/// Payload of a `{data: ...}` envelope
fn unwrap_data(mut body: JsonValue) -> Result<JsonValue> {
    match body.get_mut("data").map(JsonValue::take) {
        Some(data) => Ok(data),
        None => match body.get_mut("message").map(JsonValue::take) {
            Some(message @ JsonValue::Object(_)) => Ok(message),
            _ => Err(ClientError::Decode("response has no data".into())),
        },
    }
}

fn into_record(value: JsonValue) -> Result<Record> {
    Record::from_json(value).ok_or_else(|| ClientError::Decode("record is not an object".into()))
}

fn status_error(status: StatusCode, body: Option<JsonValue>) -> ClientError {
    let message = body
        .as_ref()
        .and_then(server_message)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    tracing::warn!("Request failed with {}: {}", status.as_u16(), message);
    ClientError::Status {
        status: status.as_u16(),
        message,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctype_meta::Filter;
    use pretty_assertions::assert_eq;

    fn client() -> HttpDoctypeClient {
        HttpDoctypeClient::new(&ClientConfig::new("https://crm.example.com")).unwrap()
    }

    #[test]
    fn method_and_resource_urls() {
        let client = client();
        assert_eq!(
            client.method_url("list_info").unwrap().as_str(),
            "https://crm.example.com/api/method/erptech_lead.api.doctype.list_info"
        );
        assert_eq!(
            client.resource_url("Plot Detail", Some("PLOT/1")).unwrap().as_str(),
            "https://crm.example.com/api/resource/Plot%20Detail/PLOT%2F1"
        );
    }

    #[test]
    fn host_with_path_prefix() {
        let client = HttpDoctypeClient::new(&ClientConfig::new("https://example.com/erp/")).unwrap();
        assert_eq!(client.base().as_str(), "https://example.com/erp/api");
        assert_eq!(
            client.resource_url("Lead", None).unwrap().as_str(),
            "https://example.com/erp/api/resource/Lead"
        );
    }

    #[test]
    fn list_params_encode_collections() {
        let query = ListQuery::new("Lead")
            .with_fields(["name", "status"])
            .filter(Filter::equals("status", "Open"))
            .page(2);
        let params = list_query_params(&query).unwrap();
        assert_eq!(
            params,
            vec![
                ("doctype", "Lead".to_string()),
                ("fields", r#"["name","status"]"#.to_string()),
                ("filters", r#"[["status","=","Open"]]"#.to_string()),
                ("page", "2".to_string()),
                ("page_length", "10".to_string()),
                ("order_by", "modified desc".to_string()),
            ]
        );
    }

    #[test]
    fn token_decoding() {
        assert_eq!(decode_token("a2V5OnNlY3JldA==").unwrap(), "key:secret");
        assert!(matches!(decode_token("%%%"), Err(ClientError::InvalidToken(_))));
        // Bad token is discarded rather than failing construction
        let config = ClientConfig::new("https://crm.example.com").with_token("%%%");
        assert!(HttpDoctypeClient::new(&config).is_ok());
    }

    #[test]
    fn envelopes() {
        assert_eq!(unwrap_data(json!({"data": {"a": 1}})).unwrap(), json!({"a": 1}));
        assert_eq!(unwrap_data(json!({"message": {"a": 1}})).unwrap(), json!({"a": 1}));
        assert!(unwrap_data(json!({"message": "ok"})).is_err());
    }

    #[test]
    fn status_error_prefers_server_message() {
        let err = status_error(StatusCode::EXPECTATION_FAILED, Some(json!({"message": "Duplicate plot"})));
        assert_eq!(err.user_message(), "Duplicate plot");
        assert_eq!(err.status(), Some(417));
        let err = status_error(StatusCode::NOT_FOUND, None);
        assert_eq!(err.to_string(), "server returned 404: Not Found");
    }
}
