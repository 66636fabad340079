//! Teams.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{non_blank, IdList, Params};
use crate::resources::entries::EntryFilter;
use crate::resources::id_params;
use crate::routes;

#[derive(Debug, Clone, Default)]
pub struct TeamFilter {
    pub name: Option<String>,
    /// Teams containing any of these users.
    pub user_ids: Option<IdList>,
}

impl TeamFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.ids("user_ids", self.user_ids.as_ref())?;
        Ok(params)
    }
}

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub name: String,
    pub user_ids: IdList,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, user_ids: impl Into<IdList>) -> Self {
        Self {
            name: name.into(),
            user_ids: user_ids.into(),
        }
    }

    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new().with("name", non_blank("name", &self.name)?);
        params.ids("user_ids", Some(&self.user_ids))?;
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_teams(&self, filter: &TeamFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_TEAMS, &[], &params)
    }

    pub fn get_team(&self, team_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_TEAM, &[team_id], &Params::new())
    }

    pub fn create_team(&self, team: &NewTeam) -> Result<Value, ApiError> {
        let params = team.build_params()?;
        self.call_record(routes::CREATE_TEAM, &[], &params)
    }

    /// Rename a team. Membership changes go through
    /// [`add_users_to_team`](Self::add_users_to_team) and
    /// [`remove_users_from_team`](Self::remove_users_from_team).
    pub fn edit_team(&self, team_id: u64, name: &str) -> Result<Value, ApiError> {
        let params = Params::new().with("name", non_blank("name", name)?);
        self.call_record(routes::EDIT_TEAM, &[team_id], &params)
    }

    pub fn list_team_entries(&self, team_id: u64, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_TEAM_ENTRIES, &[team_id], &params)
    }

    pub fn list_team_users(&self, team_id: u64) -> Result<Vec<Value>, ApiError> {
        self.call_list(routes::LIST_TEAM_USERS, &[team_id], &Params::new())
    }

    /// Returns the team's users after the change.
    pub fn add_users_to_team(&self, team_id: u64, user_ids: impl Into<IdList>) -> Result<Value, ApiError> {
        let params = id_params("user_ids", user_ids)?;
        self.call_record(routes::ADD_USERS_TO_TEAM, &[team_id], &params)
    }

    pub fn remove_users_from_team(&self, team_id: u64, user_ids: impl Into<IdList>) -> Result<(), ApiError> {
        let params = id_params("user_ids", user_ids)?;
        self.call_action(routes::REMOVE_USERS_FROM_TEAM, &[team_id], &params)
    }

    pub fn remove_all_users_from_team(&self, team_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::REMOVE_ALL_USERS_FROM_TEAM, &[team_id], &Params::new())
    }

    pub fn delete_team(&self, team_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_TEAM, &[team_id], &Params::new())
    }
}
