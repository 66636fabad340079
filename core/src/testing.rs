//! Recording stub transport and response helpers for unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ops::Range;

use serde_json::{json, Value};
use url::Url;

use crate::client::NokoClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};

/// Replays canned responses in order and records every request it sees.
pub(crate) struct StubTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl StubTransport {
    pub(crate) fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into_iter().collect()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn last_request(&self) -> HttpRequest {
        self.requests
            .borrow()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport("stub has no response left".to_string()))
    }
}

pub(crate) fn client(responses: Vec<HttpResponse>) -> NokoClient<StubTransport> {
    NokoClient::new("secret-token")
        .with_base_url("https://noko.test/v2")
        .with_transport(StubTransport::new(responses))
}

pub(crate) fn json_response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
    }
}

pub(crate) fn empty(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: String::new(),
    }
}

/// A 200 page holding `{"id": n}` for every `n` in `ids`.
pub(crate) fn page_of(ids: Range<u64>) -> HttpResponse {
    let records: Vec<Value> = ids.map(|id| json!({ "id": id })).collect();
    json_response(200, Value::Array(records))
}

/// Decoded query pairs of a request URL, in order.
pub(crate) fn query_of(request: &HttpRequest) -> Vec<(String, String)> {
    Url::parse(&request.url)
        .expect("request URL is absolute")
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Path of a request URL.
pub(crate) fn path_of(request: &HttpRequest) -> String {
    Url::parse(&request.url)
        .expect("request URL is absolute")
        .path()
        .to_string()
}

/// Parsed JSON body of a request.
pub(crate) fn body_of(request: &HttpRequest) -> Value {
    serde_json::from_str(request.body.as_deref().expect("request has a body")).expect("body is JSON")
}
