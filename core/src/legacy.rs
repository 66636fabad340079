//! Client for the legacy Freckle v1 API.
//!
//! v1 authenticates with an account name and an API token. The token
//! travels as the `token` query parameter, paths end in `.json`, and list
//! values in the query string are written as repeated keys
//! (`search[projects]=1&search[projects]=2`). Only a generic
//! [`FreckleClient::fetch_json`] is offered; v1 has no typed resource layer.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::client::{build_url, parse_response, USER_AGENT};
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, Transport, UreqTransport};
use crate::params::{ListEncoding, Params};

/// Query parameter carrying the v1 API token.
pub const TOKEN_PARAM: &str = "token";

/// Account-scoped client for `https://<account>.letsfreckle.com/api`.
#[derive(Debug)]
pub struct FreckleClient<T = UreqTransport> {
    account: String,
    token: SecretString,
    base_url: String,
    transport: T,
}

impl FreckleClient<UreqTransport> {
    pub fn new(account: impl Into<String>, token: impl Into<String>) -> Self {
        let account = account.into();
        Self {
            base_url: format!("https://{account}.letsfreckle.com/api"),
            account,
            token: SecretString::from(token.into()),
            transport: UreqTransport::new(),
        }
    }
}

impl<T> FreckleClient<T> {
    /// Point the client somewhere other than the account's own host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_transport<U: Transport>(self, transport: U) -> FreckleClient<U> {
        FreckleClient {
            account: self.account,
            token: self.token,
            base_url: self.base_url,
            transport,
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> FreckleClient<T> {
    /// Build a v1 request. The token is appended to `query`; `body`, when
    /// given, is sent as a JSON object.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Params,
        body: Option<&Params>,
    ) -> Result<HttpRequest, ApiError> {
        let mut pairs = query.query_pairs(ListEncoding::Repeated);
        pairs.push((TOKEN_PARAM.to_string(), self.token.expose_secret().to_string()));
        let path = format!("{}.json", path.trim_matches('/'));
        let url = build_url(&self.base_url, &path, &pairs)?;

        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("user-agent".to_string(), USER_AGENT.to_string()),
        ];
        let body = body
            .map(|params| {
                serde_json::to_string(&params.to_json()).map_err(|e| ApiError::Serialization(e.to_string()))
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

    /// Execute one v1 call. `Ok(None)` means a 2xx with no body.
    #[instrument(skip_all, fields(account = %self.account, method = %method, path = %path))]
    pub fn fetch_json(
        &self,
        method: HttpMethod,
        path: &str,
        query: &Params,
        body: Option<&Params>,
    ) -> Result<Option<Value>, ApiError> {
        let request = self.build_request(method, path, query, body)?;
        let response = self.transport.execute(&request)?;
        debug!(status = response.status, "response received");
        parse_response(response)
    }
}
