//! Time entries.
//!
//! [`EntryFilter`] is shared by every endpoint that lists entries: the
//! account-wide listing and the per-project, per-tag, per-group, per-user,
//! per-team and per-invoice variants.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{
    check_exclusive, check_range, require, wire_enum, DateInput, IdList, Params, TimestampInput,
};
use crate::resources::id_params;
use crate::routes;

wire_enum! {
    /// How a `tag_ids` filter combines multiple tags.
    TagFilterType for "tag_filter_type" {
        /// Entries tagged with every listed tag.
        And => "and",
        /// Entries tagged with exactly this combination of tags.
        CombinationOf => "combination of",
    }
}

/// Filters for entry listings. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub user_ids: Option<IdList>,
    /// Only entries whose description contains this text.
    pub description: Option<String>,
    pub project_ids: Option<IdList>,
    pub tag_ids: Option<IdList>,
    pub tag_filter_type: Option<TagFilterType>,
    /// Entries logged on or after this day.
    pub from: Option<DateInput>,
    /// Entries logged on or before this day.
    pub to: Option<DateInput>,
    pub invoiced: Option<bool>,
    pub updated_from: Option<TimestampInput>,
    pub updated_to: Option<TimestampInput>,
    pub billable: Option<bool>,
    pub approved_at_from: Option<DateInput>,
    pub approved_at_to: Option<DateInput>,
}

impl EntryFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        if self.tag_filter_type.is_some() && self.tag_ids.is_none() {
            return Err(ValidationError::new("tag_filter_type", "requires `tag_ids`"));
        }

        let mut params = Params::new();
        params.ids("user_ids", self.user_ids.as_ref())?;
        params.text("description", self.description.as_ref());
        params.ids("project_ids", self.project_ids.as_ref())?;
        params.ids("tag_ids", self.tag_ids.as_ref())?;
        params.insert_opt("tag_filter_type", self.tag_filter_type);

        let from = params.date("from", self.from.as_ref())?;
        let to = params.date("to", self.to.as_ref())?;
        check_range("from", from, "to", to)?;

        params.insert_opt("invoiced", self.invoiced);
        let updated_from = params.timestamp("updated_from", self.updated_from.as_ref())?;
        let updated_to = params.timestamp("updated_to", self.updated_to.as_ref())?;
        check_range("updated_from", updated_from, "updated_to", updated_to)?;

        params.insert_opt("billable", self.billable);
        let approved_from = params.date("approved_at_from", self.approved_at_from.as_ref())?;
        let approved_to = params.date("approved_at_to", self.approved_at_to.as_ref())?;
        check_range("approved_at_from", approved_from, "approved_at_to", approved_to)?;

        Ok(params)
    }
}

/// Fields of a time entry, for creation and edits.
///
/// When editing, unset fields are left unchanged on the server.
#[derive(Debug, Clone, Default)]
pub struct EntryDetails {
    pub date: Option<DateInput>,
    pub user_id: Option<u64>,
    /// Rounded up by the server to the project's billing increment.
    pub minutes: Option<u32>,
    /// Tags and hashtags in the description are parsed by the server.
    pub description: Option<String>,
    pub project_id: Option<u64>,
    /// Logs to the project with this name, creating it if needed.
    pub project_name: Option<String>,
    /// Link to the work this entry covers (pull request, ticket).
    pub source_url: Option<String>,
}

impl EntryDetails {
    /// Details carrying the three fields every new entry needs.
    pub fn new(date: impl Into<DateInput>, user_id: u64, minutes: u32) -> Self {
        Self {
            date: Some(date.into()),
            user_id: Some(user_id),
            minutes: Some(minutes),
            ..Self::default()
        }
    }

    /// Parameters for a new entry: `date`, `user_id` and `minutes` are required.
    pub fn build_create_params(&self) -> Result<Params, ValidationError> {
        require("date", self.date.as_ref())?;
        require("user_id", self.user_id.as_ref())?;
        require("minutes", self.minutes.as_ref())?;
        self.build_edit_params()
    }

    pub fn build_edit_params(&self) -> Result<Params, ValidationError> {
        check_exclusive(
            "project_id",
            self.project_id.is_some(),
            "project_name",
            self.project_name.is_some(),
        )?;

        let mut params = Params::new();
        params.date("date", self.date.as_ref())?;
        params.insert_opt("user_id", self.user_id);
        params.insert_opt("minutes", self.minutes);
        params.text("description", self.description.as_ref());
        params.insert_opt("project_id", self.project_id);
        params.text("project_name", self.project_name.as_ref());
        params.text("source_url", self.source_url.as_ref());
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    /// All entries matching `filter`, across every page.
    pub fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_ENTRIES, &[], &params)
    }

    pub fn get_entry(&self, entry_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_ENTRY, &[entry_id], &Params::new())
    }

    pub fn create_entry(&self, entry: &EntryDetails) -> Result<Value, ApiError> {
        let params = entry.build_create_params()?;
        self.call_record(routes::CREATE_ENTRY, &[], &params)
    }

    pub fn edit_entry(&self, entry_id: u64, changes: &EntryDetails) -> Result<Value, ApiError> {
        let params = changes.build_edit_params()?;
        self.call_record(routes::EDIT_ENTRY, &[entry_id], &params)
    }

    /// Mark one entry as invoiced outside Noko. Re-marking moves the date.
    pub fn mark_entry_as_invoiced(&self, entry_id: u64, date: impl Into<DateInput>) -> Result<(), ApiError> {
        let mut params = Params::new();
        params.date("date", Some(&date.into()))?;
        self.call_action(routes::MARK_ENTRY_INVOICED, &[entry_id], &params)
    }

    pub fn mark_entries_as_invoiced(
        &self,
        entry_ids: impl Into<IdList>,
        date: impl Into<DateInput>,
    ) -> Result<(), ApiError> {
        let mut params = Params::new();
        params.ids("entry_ids", Some(&entry_ids.into()))?;
        params.date("date", Some(&date.into()))?;
        self.call_action(routes::MARK_ENTRIES_INVOICED, &[], &params)
    }

    /// Approve one entry. Without `approved_at` the server uses the current time.
    pub fn mark_entry_as_approved(
        &self,
        entry_id: u64,
        approved_at: Option<TimestampInput>,
    ) -> Result<(), ApiError> {
        let mut params = Params::new();
        params.timestamp("approved_at", approved_at.as_ref())?;
        self.call_action(routes::MARK_ENTRY_APPROVED, &[entry_id], &params)
    }

    /// Approve several entries. Entries that cannot be approved are skipped by the server.
    pub fn mark_entries_as_approved(
        &self,
        entry_ids: impl Into<IdList>,
        approved_at: Option<TimestampInput>,
    ) -> Result<(), ApiError> {
        let mut params = Params::new();
        params.ids("entry_ids", Some(&entry_ids.into()))?;
        params.timestamp("approved_at", approved_at.as_ref())?;
        self.call_action(routes::MARK_ENTRIES_APPROVED, &[], &params)
    }

    pub fn mark_entry_as_unapproved(&self, entry_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::MARK_ENTRY_UNAPPROVED, &[entry_id], &Params::new())
    }

    pub fn mark_entries_as_unapproved(&self, entry_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("entry_ids", entry_ids)?;
        self.call_action(routes::MARK_ENTRIES_UNAPPROVED, &[], &params)
    }

    /// Invoiced, approved or archived-project entries cannot be deleted.
    pub fn delete_entry(&self, entry_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_ENTRY, &[entry_id], &Params::new())
    }
}
