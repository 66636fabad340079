//! In-memory fake of the Noko v2 API.
//!
//! Covers the slice of the API the client's integration tests exercise:
//! token authentication, paginated `entries` and `tags` listings with
//! filters, entry CRUD, the entry invoicing/approval actions that answer
//! `204 No Content`, and JSON `404`/`422` errors shaped like Noko's.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, warn};

/// Header carrying the personal access token.
pub const TOKEN_HEADER: &str = "X-FreckleToken";

/// Page size used when a listing does not ask for one.
pub const DEFAULT_PER_PAGE: usize = 30;

/// Largest page a listing will return.
pub const MAX_PER_PAGE: usize = 1000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub date: String,
    pub user_id: u64,
    pub minutes: u32,
    pub description: String,
    pub project_id: Option<u64>,
    pub project_name: Option<String>,
    pub billable: bool,
    pub invoiced_at: Option<String>,
    pub approved_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewEntry {
    pub date: String,
    pub user_id: u64,
    pub minutes: u32,
    #[serde(default)]
    pub description: String,
    pub project_id: Option<u64>,
    pub project_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryChanges {
    pub date: Option<String>,
    pub user_id: Option<u64>,
    pub minutes: Option<u32>,
    pub description: Option<String>,
    pub project_id: Option<u64>,
    pub project_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub name: String,
    pub billable: bool,
}

impl Tag {
    /// A leading `*` marks the tag unbillable and is not part of the name.
    fn from_input(id: u64, raw: &str) -> Self {
        let raw = raw.trim();
        match raw.strip_prefix('*') {
            Some(name) => Tag {
                id,
                name: name.to_string(),
                billable: false,
            },
            None => Tag {
                id,
                name: raw.to_string(),
                billable: true,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTags {
    pub names: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceDate {
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkInvoice {
    pub entry_ids: Vec<u64>,
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct Approval {
    pub approved_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub user_ids: Option<String>,
    pub billable: Option<bool>,
}

impl EntryQuery {
    fn matches(&self, entry: &Entry, user_ids: Option<&[u64]>) -> bool {
        self.from.as_deref().map_or(true, |from| entry.date.as_str() >= from)
            && self.to.as_deref().map_or(true, |to| entry.date.as_str() <= to)
            && self.billable.map_or(true, |billable| entry.billable == billable)
            && user_ids.map_or(true, |ids| ids.contains(&entry.user_id))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TagQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub name: Option<String>,
    pub billable: Option<bool>,
}

/// Everything the fake server knows, keyed by ID so listings are ordered.
#[derive(Debug, Default)]
pub struct Store {
    entries: BTreeMap<u64, Entry>,
    tags: BTreeMap<u64, Tag>,
    last_id: u64,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

pub struct AppState {
    token: String,
    store: RwLock<Store>,
}

type Shared = Arc<AppState>;

/// A JSON error body: `{"message": "..."}`.
#[derive(Debug)]
pub struct Failure {
    status: StatusCode,
    message: String,
}

impl Failure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn not_found(what: &str, id: u64) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} {id} not found"))
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

pub fn app(token: impl Into<String>) -> Router {
    let state: Shared = Arc::new(AppState {
        token: token.into(),
        store: RwLock::new(Store::default()),
    });
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/mark_as_invoiced", put(mark_entries_invoiced))
        .route("/entries/{id}", get(get_entry).put(edit_entry).delete(delete_entry))
        .route("/entries/{id}/mark_as_invoiced", put(mark_entry_invoiced))
        .route("/entries/{id}/approved", put(mark_entry_approved))
        .route("/entries/{id}/unapproved", put(mark_entry_unapproved))
        .route("/tags", get(list_tags).post(create_tags))
        .route("/tags/{id}", get(get_tag).delete(delete_tag))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: impl Into<String>) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

async fn require_token(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());
    if presented != Some(state.token.as_str()) {
        warn!(path = %request.uri().path(), "rejected request without a valid token");
        return Failure::new(StatusCode::UNAUTHORIZED, "Invalid or missing access token").into_response();
    }
    next.run(request).await
}

/// One page of `items`. Pages start at 1; page 0 is read as page 1.
fn paginate<T: Clone>(items: &[T], page: Option<usize>, per_page: Option<usize>) -> Vec<T> {
    let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
    let page = page.unwrap_or(1).max(1);
    items
        .iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .cloned()
        .collect()
}

fn parse_ids(raw: &str) -> Result<Vec<u64>, Failure> {
    raw.split(',')
        .map(|part| {
            part.trim().parse().map_err(|_| {
                Failure::new(StatusCode::BAD_REQUEST, format!("`{part}` is not an ID"))
            })
        })
        .collect()
}

async fn list_entries(
    State(state): State<Shared>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Vec<Entry>>, Failure> {
    let user_ids = query.user_ids.as_deref().map(parse_ids).transpose()?;
    let store = state.store.read().await;
    let matching: Vec<Entry> = store
        .entries
        .values()
        .filter(|entry| query.matches(entry, user_ids.as_deref()))
        .cloned()
        .collect();
    let page = paginate(&matching, query.page, query.per_page);
    debug!(matching = matching.len(), returned = page.len(), "listed entries");
    Ok(Json(page))
}

async fn create_entry(
    State(state): State<Shared>,
    Json(input): Json<NewEntry>,
) -> Result<(StatusCode, Json<Entry>), Failure> {
    if input.minutes == 0 {
        return Err(Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "minutes must be positive"));
    }
    let mut store = state.store.write().await;
    let entry = Entry {
        id: store.next_id(),
        date: input.date,
        user_id: input.user_id,
        minutes: input.minutes,
        description: input.description,
        project_id: input.project_id,
        project_name: input.project_name,
        billable: true,
        invoiced_at: None,
        approved_at: None,
    };
    store.entries.insert(entry.id, entry.clone());
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry(State(state): State<Shared>, Path(id): Path<u64>) -> Result<Json<Entry>, Failure> {
    let store = state.store.read().await;
    store
        .entries
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("Entry", id))
}

async fn edit_entry(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(changes): Json<EntryChanges>,
) -> Result<Json<Entry>, Failure> {
    let mut store = state.store.write().await;
    let entry = store
        .entries
        .get_mut(&id)
        .ok_or_else(|| Failure::not_found("Entry", id))?;
    if let Some(date) = changes.date {
        entry.date = date;
    }
    if let Some(user_id) = changes.user_id {
        entry.user_id = user_id;
    }
    if let Some(minutes) = changes.minutes {
        entry.minutes = minutes;
    }
    if let Some(description) = changes.description {
        entry.description = description;
    }
    if let Some(project_id) = changes.project_id {
        entry.project_id = Some(project_id);
        entry.project_name = None;
    }
    if let Some(project_name) = changes.project_name {
        entry.project_name = Some(project_name);
        entry.project_id = None;
    }
    Ok(Json(entry.clone()))
}

async fn delete_entry(State(state): State<Shared>, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    let entry = store
        .entries
        .get(&id)
        .ok_or_else(|| Failure::not_found("Entry", id))?;
    if entry.invoiced_at.is_some() {
        return Err(Failure::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invoiced entries cannot be deleted",
        ));
    }
    store.entries.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_entry_invoiced(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    Json(input): Json<InvoiceDate>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    let entry = store
        .entries
        .get_mut(&id)
        .ok_or_else(|| Failure::not_found("Entry", id))?;
    entry.invoiced_at = Some(input.date);
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_entries_invoiced(
    State(state): State<Shared>,
    Json(input): Json<BulkInvoice>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    for id in &input.entry_ids {
        if let Some(entry) = store.entries.get_mut(id) {
            entry.invoiced_at = Some(input.date.clone());
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_entry_approved(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    approval: Option<Json<Approval>>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    let entry = store
        .entries
        .get_mut(&id)
        .ok_or_else(|| Failure::not_found("Entry", id))?;
    let approved_at = approval
        .and_then(|Json(approval)| approval.approved_at)
        .unwrap_or_else(|| format!("{}T00:00:00Z", entry.date));
    entry.approved_at = Some(approved_at);
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_entry_unapproved(
    State(state): State<Shared>,
    Path(id): Path<u64>,
) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    let entry = store
        .entries
        .get_mut(&id)
        .ok_or_else(|| Failure::not_found("Entry", id))?;
    entry.approved_at = None;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(State(state): State<Shared>, Query(query): Query<TagQuery>) -> Json<Vec<Tag>> {
    let store = state.store.read().await;
    let matching: Vec<Tag> = store
        .tags
        .values()
        .filter(|tag| query.name.as_deref().map_or(true, |name| tag.name.contains(name)))
        .filter(|tag| query.billable.map_or(true, |billable| tag.billable == billable))
        .cloned()
        .collect();
    Json(paginate(&matching, query.page, query.per_page))
}

async fn create_tags(
    State(state): State<Shared>,
    Json(input): Json<NewTags>,
) -> Result<(StatusCode, Json<Vec<Tag>>), Failure> {
    if input.names.is_empty() {
        return Err(Failure::new(StatusCode::UNPROCESSABLE_ENTITY, "names must not be empty"));
    }
    let mut store = state.store.write().await;
    let mut created = Vec::with_capacity(input.names.len());
    for name in &input.names {
        let tag = Tag::from_input(store.next_id(), name);
        store.tags.insert(tag.id, tag.clone());
        created.push(tag);
    }
    Ok((StatusCode::CREATED, Json(created)))
}

async fn get_tag(State(state): State<Shared>, Path(id): Path<u64>) -> Result<Json<Tag>, Failure> {
    let store = state.store.read().await;
    store
        .tags
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("Tag", id))
}

async fn delete_tag(State(state): State<Shared>, Path(id): Path<u64>) -> Result<StatusCode, Failure> {
    let mut store = state.store.write().await;
    store
        .tags
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or_else(|| Failure::not_found("Tag", id))
}
