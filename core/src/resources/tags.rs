//! Tags and hashtags.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{non_blank, IdList, Params};
use crate::resources::entries::EntryFilter;
use crate::resources::id_params;
use crate::routes;

#[derive(Debug, Clone, Default)]
pub struct TagFilter {
    /// Only tags whose name contains this text.
    pub name: Option<String>,
    pub billable: Option<bool>,
}

impl TagFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.insert_opt("billable", self.billable);
        Ok(params)
    }
}

/// Body for tag creation: a non-empty list of non-blank names.
fn tag_names<S: AsRef<str>>(names: &[S]) -> Result<Params, ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::new("names", "must contain at least one name"));
    }
    let names = names
        .iter()
        .map(|name| non_blank("names", name.as_ref()).map(Value::String))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Params::new().with("names", Value::Array(names)))
}

impl<T: Transport> NokoClient<T> {
    pub fn list_tags(&self, filter: &TagFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_TAGS, &[], &params)
    }

    /// Create several tags at once. A `#` prefix makes a hashtag; a leading
    /// `*` makes the tag unbillable.
    pub fn create_tags<S: AsRef<str>>(&self, names: &[S]) -> Result<Value, ApiError> {
        let params = tag_names(names)?;
        self.call_record(routes::CREATE_TAGS, &[], &params)
    }

    pub fn get_tag(&self, tag_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_TAG, &[tag_id], &Params::new())
    }

    pub fn list_tag_entries(&self, tag_id: u64, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_TAG_ENTRIES, &[tag_id], &params)
    }

    pub fn edit_tag(&self, tag_id: u64, name: &str) -> Result<Value, ApiError> {
        let params = Params::new().with("name", non_blank("name", name)?);
        self.call_record(routes::EDIT_TAG, &[tag_id], &params)
    }

    /// Merge `tag_to_merge_id` into `tag_id`. The merged tag is deleted.
    pub fn merge_tags(&self, tag_id: u64, tag_to_merge_id: u64) -> Result<(), ApiError> {
        let params = Params::new().with("tag_id", tag_to_merge_id);
        self.call_action(routes::MERGE_TAGS, &[tag_id], &params)
    }

    pub fn delete_tag(&self, tag_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_TAG, &[tag_id], &Params::new())
    }

    pub fn delete_tags(&self, tag_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("tag_ids", tag_ids)?;
        self.call_action(routes::DELETE_TAGS, &[], &params)
    }
}
