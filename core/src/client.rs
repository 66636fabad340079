//! Request construction, the transport call and the pagination walker.
//!
//! # Design
//! `NokoClient` holds read-only settings (base URL, token, page size) and a
//! [`Transport`]. A call is split into three pure-or-I/O steps:
//! `build_request` produces an `HttpRequest`, the transport executes it, and
//! `parse_response` maps the `HttpResponse` to parsed JSON, "no content", or
//! an error. Resource methods (see `crate::resources`) never touch HTTP
//! directly; they validate their arguments into `Params` and go through the
//! route table via `call`, `call_list`, `call_record` or `call_action`.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::Params;
use crate::routes::Route;

/// Sent with every request.
pub const USER_AGENT: &str = concat!("noko-core/", env!("CARGO_PKG_VERSION"));

/// Header carrying the personal access token.
pub const TOKEN_HEADER: &str = "X-FreckleToken";

/// Synchronous client for the Noko v2 API.
///
/// Stateless between calls: every method builds a fresh request, and a
/// client can be shared across threads whenever its transport can.
#[derive(Debug)]
pub struct NokoClient<T = UreqTransport> {
    base_url: String,
    access_token: SecretString,
    page_size: u32,
    transport: T,
}

impl NokoClient<UreqTransport> {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new(access_token))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: normalize_base_url(config.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)),
            access_token: config.access_token,
            page_size: clamp_page_size(config.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
            transport: UreqTransport::new(),
        }
    }
}

impl<T> NokoClient<T> {
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Records requested per page by list operations. Zero is raised to one
    /// and anything above [`MAX_PAGE_SIZE`] is lowered to it.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = clamp_page_size(page_size);
        self
    }

    #[must_use]
    pub fn with_transport<U: Transport>(self, transport: U) -> NokoClient<U> {
        NokoClient {
            base_url: self.base_url,
            access_token: self.access_token,
            page_size: self.page_size,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> NokoClient<T> {
    /// Build an authenticated request for `path` (relative to the base URL).
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<HttpRequest, ApiError> {
        let url = build_url(&self.base_url, path, query)?;
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), USER_AGENT.to_string()),
            (
                TOKEN_HEADER.to_string(),
                self.access_token.expose_secret().to_string(),
            ),
        ];
        let body = body
            .map(|body| {
                serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))
            })
            .transpose()?;
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
        })
    }

    /// Execute one request. `Ok(None)` means the server answered 2xx with
    /// no body.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Option<Value>, ApiError> {
        let request = self.build_request(method, path, query, body)?;
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, "response received");
        parse_response(response)
    }

    /// Walk a paginated list endpoint to completion.
    ///
    /// Pages are requested strictly in order starting at 1. A page holding
    /// exactly `page_size` records means another page may follow; anything
    /// else ends the walk. An error on any page discards what was collected.
    #[instrument(skip_all, fields(path = %path, page_size = self.page_size))]
    pub fn list_all(&self, path: &str, query: &[(String, String)]) -> Result<Vec<Value>, ApiError> {
        let page_size = self.page_size.to_string();
        let mut records = Vec::new();
        let mut page: u32 = 1;
        loop {
            let mut page_query = query.to_vec();
            page_query.push(("page".to_string(), page.to_string()));
            page_query.push(("per_page".to_string(), page_size.clone()));

            let fetched = match self.send(HttpMethod::Get, path, &page_query, None)? {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(ApiError::Deserialization(format!(
                        "expected a JSON array on page {page}, got {}",
                        json_kind(&other)
                    )));
                }
                None => Vec::new(),
            };
            let count = fetched.len();
            records.extend(fetched);
            debug!(page, count, total = records.len(), "fetched page");

            if count != self.page_size as usize {
                return Ok(records);
            }
            page += 1;
        }
    }

    /// Dispatch a route: GET parameters go to the query string, everything
    /// else to a JSON body (omitted when there are no parameters).
    pub(crate) fn call(&self, route: Route, ids: &[u64], params: &Params) -> Result<Option<Value>, ApiError> {
        let path = route.path(ids);
        if route.method == HttpMethod::Get {
            return self.send(route.method, &path, &params.query_pairs(route.encoding), None);
        }
        let body = (!params.is_empty()).then(|| params.to_json());
        self.send(route.method, &path, &[], body.as_ref())
    }

    pub(crate) fn call_list(&self, route: Route, ids: &[u64], params: &Params) -> Result<Vec<Value>, ApiError> {
        debug_assert_eq!(route.method, HttpMethod::Get);
        self.list_all(&route.path(ids), &params.query_pairs(route.encoding))
    }

    /// Dispatch a route that must answer with one JSON document.
    pub(crate) fn call_record(&self, route: Route, ids: &[u64], params: &Params) -> Result<Value, ApiError> {
        self.call(route, ids, params)?.ok_or_else(|| {
            ApiError::Deserialization("expected a JSON body, got an empty response".to_string())
        })
    }

    /// Dispatch a route whose response body, if any, carries nothing useful.
    pub(crate) fn call_action(&self, route: Route, ids: &[u64], params: &Params) -> Result<(), ApiError> {
        self.call(route, ids, params).map(drop)
    }
}

/// Map an HTTP response to parsed JSON or "no content".
pub fn parse_response(response: HttpResponse) -> Result<Option<Value>, ApiError> {
    check_status(&response)?;
    if response.body.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to [`ApiError::Http`].
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    warn!(status = response.status, "request rejected by server");
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

/// Join base URL and path, then append `query` form-encoded.
pub(crate) fn build_url(base_url: &str, path: &str, query: &[(String, String)]) -> Result<String, ApiError> {
    let raw = format!("{base_url}/{}", path.trim_start_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))?;
    if !query.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(key, value)| (key.as_str(), value.as_str())));
    }
    Ok(url.to_string())
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

// The walker ends on a short page, so a size the server would cut down
// must never be requested.
fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::{client, empty, json_response, page_of, query_of, StubTransport};

    #[test]
    fn build_request_attaches_auth_and_json_headers() {
        let c = client(Vec::new());
        let body = json!({ "name": "Standup" });
        let req = c
            .build_request(HttpMethod::Put, "tags/12", &[], Some(&body))
            .unwrap();

        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "https://noko.test/v2/tags/12");
        assert_eq!(req.header("X-FreckleToken"), Some("secret-token"));
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("user-agent").unwrap().starts_with("noko-core/"));
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn build_request_without_body_has_no_content_type() {
        let c = client(Vec::new());
        let req = c
            .build_request(
                HttpMethod::Get,
                "entries",
                &[("from".to_string(), "2023-08-01".to_string())],
                None,
            )
            .unwrap();
        assert_eq!(req.url, "https://noko.test/v2/entries?from=2023-08-01");
        assert!(req.body.is_none());
        assert_eq!(req.header("content-type"), None);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = client(Vec::new()).with_base_url("http://localhost:3000/");
        assert_eq!(c.base_url(), "http://localhost:3000");
        let req = c.build_request(HttpMethod::Get, "/tags", &[], None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/tags");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let c = client(Vec::new()).with_base_url("not a url");
        let err = c.build_request(HttpMethod::Get, "tags", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn send_parses_json() {
        let c = client(vec![json_response(200, json!({ "id": 1, "minutes": 30 }))]);
        let record = c.send(HttpMethod::Get, "entries/1", &[], None).unwrap();
        assert_eq!(record, Some(json!({ "id": 1, "minutes": 30 })));
    }

    #[test]
    fn no_content_is_distinct_from_empty_list() {
        let c = client(vec![empty(204)]);
        let outcome = c.send(HttpMethod::Delete, "entries/1", &[], None).unwrap();
        assert_eq!(outcome, None);

        let c = client(vec![json_response(200, json!([]))]);
        let outcome = c.send(HttpMethod::Get, "entries", &[], None).unwrap();
        assert_eq!(outcome, Some(json!([])));
    }

    #[test]
    fn not_found_surfaces_status_and_body_without_retry() {
        let body = r#"{"message":"Entry not found"}"#;
        let c = client(vec![HttpResponse {
            status: 404,
            headers: Vec::new(),
            body: body.to_string(),
        }]);
        let err = c.send(HttpMethod::Get, "entries/9", &[], None).unwrap_err();
        match err {
            ApiError::Http { status, body: got } => {
                assert_eq!(status, 404);
                assert_eq!(got, body);
            }
            other => panic!("expected HTTP error, got {other:?}"),
        }
        assert_eq!(c.transport().calls(), 1);
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let c = client(vec![HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "<html>oops</html>".to_string(),
        }]);
        let err = c.send(HttpMethod::Get, "tags", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }

    #[test]
    fn walker_concatenates_pages_until_a_short_one() {
        let c = client(vec![page_of(0..50), page_of(50..100), page_of(100..103)]).with_page_size(50);
        let records = c.list_all("entries", &[]).unwrap();

        assert_eq!(records.len(), 103);
        let ids: Vec<u64> = records.iter().map(|r| r["id"].as_u64().unwrap()).collect();
        assert_eq!(ids, (0..103).collect::<Vec<_>>());

        let requests = c.transport().requests();
        assert_eq!(requests.len(), 3);
        for (n, request) in requests.iter().enumerate() {
            let query = query_of(request);
            assert!(query.contains(&("page".to_string(), (n + 1).to_string())));
            assert!(query.contains(&("per_page".to_string(), "50".to_string())));
        }
    }

    #[test]
    fn walker_stops_after_an_empty_first_page() {
        let c = client(vec![json_response(200, json!([]))]).with_page_size(50);
        let records = c.list_all("entries", &[]).unwrap();
        assert!(records.is_empty());
        assert_eq!(c.transport().calls(), 1);
    }

    #[test]
    fn walker_follows_a_full_page_with_an_empty_one() {
        let c = client(vec![page_of(0..2), json_response(200, json!([]))]).with_page_size(2);
        assert_eq!(c.list_all("tags", &[]).unwrap().len(), 2);
        assert_eq!(c.transport().calls(), 2);
    }

    #[test]
    fn walker_discards_partial_results_on_error() {
        let c = client(vec![page_of(0..2), empty(500)]).with_page_size(2);
        let err = c.list_all("entries", &[]).unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(c.transport().calls(), 2);
    }

    #[test]
    fn walker_keeps_caller_query() {
        let c = client(vec![page_of(0..1)]).with_page_size(10);
        let query = vec![("billable".to_string(), "true".to_string())];
        c.list_all("tags", &query).unwrap();
        let sent = query_of(&c.transport().requests()[0]);
        assert_eq!(
            sent,
            vec![
                ("billable".to_string(), "true".to_string()),
                ("page".to_string(), "1".to_string()),
                ("per_page".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn walker_rejects_a_page_that_is_not_an_array() {
        let c = client(vec![json_response(200, json!({ "id": 1 }))]).with_page_size(1);
        let err = c.list_all("entries", &[]).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(ref msg) if msg.contains("an object")), "{err:?}");
        assert_eq!(c.transport().calls(), 1);
    }

    #[test]
    fn zero_page_size_is_raised_to_one() {
        let c = client(Vec::new()).with_page_size(0);
        assert_eq!(c.page_size(), 1);
    }

    #[test]
    fn page_size_is_capped_at_the_api_maximum() {
        let c = client(vec![page_of(0..1000), page_of(1000..1005)]).with_page_size(2000);
        assert_eq!(c.page_size(), MAX_PAGE_SIZE);

        let records = c.list_all("entries", &[]).unwrap();
        assert_eq!(records.len(), 1005);
        let first = query_of(&c.transport().requests()[0]);
        assert!(first.contains(&("per_page".to_string(), "1000".to_string())));

        let mut config = ClientConfig::new("abc");
        config.page_size = Some(5000);
        assert_eq!(NokoClient::from_config(config).page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn from_config_applies_overrides() {
        let mut config = ClientConfig::new("abc");
        config.base_url = Some("http://localhost:9999/".to_string());
        config.page_size = Some(25);
        let c = NokoClient::from_config(config);
        assert_eq!(c.base_url(), "http://localhost:9999");
        assert_eq!(c.page_size(), 25);

        let c = NokoClient::new("abc");
        assert_eq!(c.base_url(), DEFAULT_BASE_URL);
        assert_eq!(c.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn stub_exhaustion_is_a_transport_error() {
        let c = NokoClient::new("abc").with_transport(StubTransport::new(Vec::new()));
        let err = c.send(HttpMethod::Get, "tags", &[], None).unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
