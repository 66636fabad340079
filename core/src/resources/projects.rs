//! Projects.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{require, IdList, Params};
use crate::resources::entries::EntryFilter;
use crate::resources::expenses::ExpenseFilter;
use crate::resources::id_params;
use crate::routes;

/// Billing increments, in minutes, that a project can round entries up to.
pub const BILLING_INCREMENTS: [u32; 8] = [1, 5, 6, 10, 15, 20, 30, 60];

fn check_billing_increment(value: Option<u32>) -> Result<(), ValidationError> {
    match value {
        Some(minutes) if !BILLING_INCREMENTS.contains(&minutes) => Err(ValidationError::new(
            "billing_increment",
            format!("{minutes} is not one of: 1, 5, 6, 10, 15, 20, 30, 60"),
        )),
        _ => Ok(()),
    }
}

/// Colors are `#rrggbb`.
fn check_color(value: Option<&String>) -> Result<(), ValidationError> {
    let Some(color) = value else {
        return Ok(());
    };
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(ValidationError::new(
            "color",
            format!("`{color}` is not a #rrggbb hex color"),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub name: Option<String>,
    pub project_group_ids: Option<IdList>,
    pub billing_increment: Option<u32>,
    /// `false` lists archived projects.
    pub enabled: Option<bool>,
    pub billable: Option<bool>,
}

impl ProjectFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        check_billing_increment(self.billing_increment)?;

        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.ids("project_group_ids", self.project_group_ids.as_ref())?;
        params.insert_opt("billing_increment", self.billing_increment);
        params.insert_opt("enabled", self.enabled);
        params.insert_opt("billable", self.billable);
        Ok(params)
    }
}

/// Fields of a project. Edits leave unset fields unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProjectDetails {
    pub name: Option<String>,
    /// Only settable at creation.
    pub billable: Option<bool>,
    pub project_group_id: Option<u64>,
    pub billing_increment: Option<u32>,
    pub color: Option<String>,
}

impl ProjectDetails {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn build_create_params(&self) -> Result<Params, ValidationError> {
        require("name", self.name.as_ref())?;
        let mut params = self.common_params()?;
        params.insert_opt("billable", self.billable);
        Ok(params)
    }

    pub fn build_edit_params(&self) -> Result<Params, ValidationError> {
        if self.billable.is_some() {
            return Err(ValidationError::new("billable", "cannot be changed after creation"));
        }
        self.common_params()
    }

    fn common_params(&self) -> Result<Params, ValidationError> {
        check_billing_increment(self.billing_increment)?;
        check_color(self.color.as_ref())?;

        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.insert_opt("project_group_id", self.project_group_id);
        params.insert_opt("billing_increment", self.billing_increment);
        params.text("color", self.color.as_ref());
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECTS, &[], &params)
    }

    pub fn get_project(&self, project_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_PROJECT, &[project_id], &Params::new())
    }

    pub fn create_project(&self, project: &ProjectDetails) -> Result<Value, ApiError> {
        let params = project.build_create_params()?;
        self.call_record(routes::CREATE_PROJECT, &[], &params)
    }

    pub fn list_project_entries(&self, project_id: u64, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECT_ENTRIES, &[project_id], &params)
    }

    pub fn list_project_expenses(
        &self,
        project_id: u64,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECT_EXPENSES, &[project_id], &params)
    }

    pub fn edit_project(&self, project_id: u64, changes: &ProjectDetails) -> Result<Value, ApiError> {
        let params = changes.build_edit_params()?;
        self.call_record(routes::EDIT_PROJECT, &[project_id], &params)
    }

    /// Move everything from `project_to_merge_id` into `project_id`, then
    /// delete the merged project.
    pub fn merge_projects(&self, project_id: u64, project_to_merge_id: u64) -> Result<(), ApiError> {
        let params = Params::new().with("project_id", project_to_merge_id);
        self.call_action(routes::MERGE_PROJECTS, &[project_id], &params)
    }

    /// Only projects without entries, expenses or invoices can be deleted.
    pub fn delete_project(&self, project_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_PROJECT, &[project_id], &Params::new())
    }

    pub fn archive_project(&self, project_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::ARCHIVE_PROJECT, &[project_id], &Params::new())
    }

    pub fn unarchive_project(&self, project_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::UNARCHIVE_PROJECT, &[project_id], &Params::new())
    }

    pub fn archive_projects(&self, project_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("project_ids", project_ids)?;
        self.call_action(routes::ARCHIVE_PROJECTS, &[], &params)
    }

    pub fn unarchive_projects(&self, project_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("project_ids", project_ids)?;
        self.call_action(routes::UNARCHIVE_PROJECTS, &[], &params)
    }

    pub fn delete_projects(&self, project_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("project_ids", project_ids)?;
        self.call_action(routes::DELETE_PROJECTS, &[], &params)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{body_of, client, empty, json_response, page_of, path_of, query_of};

    #[test]
    fn filter_joins_group_ids() {
        let filter = ProjectFilter {
            project_group_ids: Some(vec![3u64, 4].into()),
            enabled: Some(false),
            ..ProjectFilter::default()
        };
        let c = client(vec![page_of(0..2)]);
        c.list_projects(&filter).unwrap();
        let query = query_of(&c.transport().last_request());
        assert!(query.contains(&("project_group_ids".to_string(), "3,4".to_string())));
        assert!(query.contains(&("enabled".to_string(), "false".to_string())));
    }

    #[test]
    fn billing_increment_must_be_supported() {
        for ok in BILLING_INCREMENTS {
            assert!(ProjectDetails {
                billing_increment: Some(ok),
                ..ProjectDetails::new("Site")
            }
            .build_create_params()
            .is_ok());
        }

        let c = client(Vec::new());
        let filter = ProjectFilter {
            billing_increment: Some(7),
            ..ProjectFilter::default()
        };
        let err = c.list_projects(&filter).unwrap_err();
        assert!(err.to_string().starts_with("invalid `billing_increment`"));
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn color_must_be_hex() {
        for bad in ["red", "#ff00f", "#gg0000", "ff0000f"] {
            let details = ProjectDetails {
                color: Some(bad.to_string()),
                ..ProjectDetails::default()
            };
            let err = details.build_edit_params().unwrap_err();
            assert_eq!(err.field, "color", "{bad}");
        }
        let details = ProjectDetails {
            color: Some("#ff9898".to_string()),
            ..ProjectDetails::default()
        };
        assert!(details.build_edit_params().is_ok());
    }

    #[test]
    fn create_requires_name_and_keeps_billable() {
        let c = client(vec![json_response(201, json!({ "id": 37396 }))]);
        let err = c.create_project(&ProjectDetails::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid `name`: is required");
        assert_eq!(c.transport().calls(), 0);

        let project = ProjectDetails {
            billable: Some(false),
            ..ProjectDetails::new("Internal")
        };
        c.create_project(&project).unwrap();
        assert_eq!(
            body_of(&c.transport().last_request()),
            json!({ "name": "Internal", "billable": false })
        );
    }

    #[test]
    fn billable_cannot_be_edited() {
        let c = client(Vec::new());
        let changes = ProjectDetails {
            billable: Some(true),
            ..ProjectDetails::default()
        };
        let err = c.edit_project(1, &changes).unwrap_err();
        assert_eq!(err.to_string(), "invalid `billable`: cannot be changed after creation");
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn nested_listings() {
        let c = client(vec![page_of(0..1), page_of(0..1)]);
        c.list_project_entries(5, &EntryFilter::default()).unwrap();
        c.list_project_expenses(5, &ExpenseFilter::default()).unwrap();
        let requests = c.transport().requests();
        assert_eq!(path_of(&requests[0]), "/v2/projects/5/entries");
        assert_eq!(path_of(&requests[1]), "/v2/projects/5/expenses");
    }

    #[test]
    fn archive_and_bulk_actions() {
        let c = client(vec![empty(204), empty(204), empty(204), empty(204), empty(204)]);
        c.archive_project(5).unwrap();
        c.unarchive_project(5).unwrap();
        c.archive_projects([5u64, 6]).unwrap();
        c.unarchive_projects("5").unwrap();
        c.delete_projects(vec![7u64]).unwrap();

        let requests = c.transport().requests();
        let paths: Vec<String> = requests.iter().map(path_of).collect();
        assert_eq!(
            paths,
            vec![
                "/v2/projects/5/archive",
                "/v2/projects/5/unarchive",
                "/v2/projects/archive",
                "/v2/projects/unarchive",
                "/v2/projects/delete",
            ]
        );
        assert!(requests.iter().all(|r| r.method == HttpMethod::Put));
        assert_eq!(body_of(&requests[2]), json!({ "project_ids": [5, 6] }));
        assert_eq!(body_of(&requests[4]), json!({ "project_ids": [7] }));
    }

    #[test]
    fn merge_sends_the_merged_project() {
        let c = client(vec![empty(204), empty(204)]);
        c.merge_projects(1, 2).unwrap();
        c.delete_project(2).unwrap();
        let requests = c.transport().requests();
        assert_eq!(body_of(&requests[0]), json!({ "project_id": 2 }));
        assert_eq!(requests[1].method, HttpMethod::Delete);
    }
}
