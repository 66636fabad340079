//! Project groups.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{non_blank, IdList, Params};
use crate::resources::entries::EntryFilter;
use crate::resources::id_params;
use crate::resources::projects::ProjectFilter;
use crate::routes;

#[derive(Debug, Clone, Default)]
pub struct ProjectGroupFilter {
    pub name: Option<String>,
    /// Groups containing any of these projects.
    pub project_ids: Option<IdList>,
}

impl ProjectGroupFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.ids("project_ids", self.project_ids.as_ref())?;
        Ok(params)
    }
}

/// A group to create, with the projects it starts out holding.
#[derive(Debug, Clone)]
pub struct NewProjectGroup {
    pub name: String,
    pub project_ids: IdList,
}

impl NewProjectGroup {
    pub fn new(name: impl Into<String>, project_ids: impl Into<IdList>) -> Self {
        Self {
            name: name.into(),
            project_ids: project_ids.into(),
        }
    }

    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new().with("name", non_blank("name", &self.name)?);
        params.ids("project_ids", Some(&self.project_ids))?;
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_project_groups(&self, filter: &ProjectGroupFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECT_GROUPS, &[], &params)
    }

    pub fn create_project_group(&self, group: &NewProjectGroup) -> Result<Value, ApiError> {
        let params = group.build_params()?;
        self.call_record(routes::CREATE_PROJECT_GROUP, &[], &params)
    }

    pub fn get_project_group(&self, group_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_PROJECT_GROUP, &[group_id], &Params::new())
    }

    pub fn edit_project_group(&self, group_id: u64, name: &str) -> Result<Value, ApiError> {
        let params = Params::new().with("name", non_blank("name", name)?);
        self.call_record(routes::EDIT_PROJECT_GROUP, &[group_id], &params)
    }

    pub fn list_project_group_entries(
        &self,
        group_id: u64,
        filter: &EntryFilter,
    ) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECT_GROUP_ENTRIES, &[group_id], &params)
    }

    pub fn list_project_group_projects(
        &self,
        group_id: u64,
        filter: &ProjectFilter,
    ) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_PROJECT_GROUP_PROJECTS, &[group_id], &params)
    }

    /// Returns the updated list of projects in the group.
    pub fn add_projects_to_group(&self, group_id: u64, project_ids: impl Into<IdList>) -> Result<Value, ApiError> {
        let params = id_params("project_ids", project_ids)?;
        self.call_record(routes::ADD_PROJECTS_TO_GROUP, &[group_id], &params)
    }

    pub fn remove_projects_from_group(
        &self,
        group_id: u64,
        project_ids: impl Into<IdList>,
    ) -> Result<(), ApiError> {
        let params = id_params("project_ids", project_ids)?;
        self.call_action(routes::REMOVE_PROJECTS_FROM_GROUP, &[group_id], &params)
    }

    pub fn remove_all_projects_from_group(&self, group_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::REMOVE_ALL_PROJECTS_FROM_GROUP, &[group_id], &Params::new())
    }

    /// The group's projects are kept and become ungrouped.
    pub fn delete_project_group(&self, group_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_PROJECT_GROUP, &[group_id], &Params::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{body_of, client, empty, json_response, page_of, path_of, query_of};

    #[test]
    fn create_needs_name_and_projects() {
        let c = client(vec![json_response(201, json!({ "id": 3 }))]);

        let err = c.create_project_group(&NewProjectGroup::new(" ", [1u64])).unwrap_err();
        assert_eq!(err.to_string(), "invalid `name`: must not be blank");
        let err = c
            .create_project_group(&NewProjectGroup::new("Clients", Vec::<u64>::new()))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid `project_ids`: must contain at least one ID");
        assert_eq!(c.transport().calls(), 0);

        c.create_project_group(&NewProjectGroup::new("Clients", "1, 2")).unwrap();
        let request = c.transport().last_request();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(body_of(&request), json!({ "name": "Clients", "project_ids": [1, 2] }));
    }

    #[test]
    fn listing_filters_by_project() {
        let c = client(vec![page_of(0..1)]);
        let filter = ProjectGroupFilter {
            project_ids: Some("8,9".into()),
            ..ProjectGroupFilter::default()
        };
        c.list_project_groups(&filter).unwrap();
        let query = query_of(&c.transport().last_request());
        assert_eq!(query[0], ("project_ids".to_string(), "8,9".to_string()));
    }

    #[test]
    fn membership_changes() {
        let c = client(vec![
            json_response(200, json!([{ "id": 1 }, { "id": 2 }])),
            empty(204),
            empty(204),
        ]);
        let projects = c.add_projects_to_group(7, [1u64, 2]).unwrap();
        assert!(projects.is_array());
        c.remove_projects_from_group(7, 2u64).unwrap();
        c.remove_all_projects_from_group(7).unwrap();

        let requests = c.transport().requests();
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(path_of(&requests[0]), "/v2/project_groups/7/add_projects");
        assert_eq!(body_of(&requests[1]), json!({ "project_ids": [2] }));
        assert_eq!(path_of(&requests[2]), "/v2/project_groups/7/remove_all_projects");
        assert!(requests[2].body.is_none());
    }

    #[test]
    fn nested_listings_and_edit() {
        let c = client(vec![
            page_of(0..1),
            page_of(0..1),
            json_response(200, json!({ "id": 7, "name": "Retainers" })),
        ]);
        c.list_project_group_entries(7, &EntryFilter::default()).unwrap();
        c.list_project_group_projects(7, &ProjectFilter::default()).unwrap();
        c.edit_project_group(7, "Retainers").unwrap();

        let requests = c.transport().requests();
        assert_eq!(path_of(&requests[0]), "/v2/project_groups/7/entries");
        assert_eq!(path_of(&requests[1]), "/v2/project_groups/7/projects");
        assert_eq!(body_of(&requests[2]), json!({ "name": "Retainers" }));
    }
}
