//! Users of the account.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{non_blank, require, wire_enum, Params};
use crate::resources::entries::EntryFilter;
use crate::resources::expenses::ExpenseFilter;
use crate::routes;

wire_enum! {
    /// Permission level of a user.
    UserRole for "role" {
        Supervisor => "supervisor",
        Leader => "leader",
        Coworker => "coworker",
        Contractor => "contractor",
    }
}

wire_enum! {
    UserState for "state" {
        Disabled => "disabled",
        /// Invited but not yet signed up.
        Pending => "pending",
        Active => "active",
        Suspended => "suspended",
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub state: Option<UserState>,
}

impl UserFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.text("name", self.name.as_ref());
        params.text("email", self.email.as_ref());
        params.insert_opt("role", self.role);
        params.insert_opt("state", self.state);
        Ok(params)
    }
}

/// Fields of a user. The email address is fixed once the user exists.
#[derive(Debug, Clone, Default)]
pub struct UserDetails {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
}

impl UserDetails {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            ..Self::default()
        }
    }

    pub fn build_create_params(&self) -> Result<Params, ValidationError> {
        let email = non_blank("email", require("email", self.email.as_ref())?)?;
        Ok(self.names_and_role().with("email", email))
    }

    pub fn build_edit_params(&self) -> Result<Params, ValidationError> {
        if self.email.is_some() {
            return Err(ValidationError::new("email", "cannot be changed after creation"));
        }
        Ok(self.names_and_role())
    }

    fn names_and_role(&self) -> Params {
        let mut params = Params::new();
        params.text("first_name", self.first_name.as_ref());
        params.text("last_name", self.last_name.as_ref());
        params.insert_opt("role", self.role);
        params
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_users(&self, filter: &UserFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_USERS, &[], &params)
    }

    pub fn get_user(&self, user_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_USER, &[user_id], &Params::new())
    }

    /// Invite a new user by email.
    pub fn create_user(&self, user: &UserDetails) -> Result<Value, ApiError> {
        let params = user.build_create_params()?;
        self.call_record(routes::CREATE_USER, &[], &params)
    }

    pub fn edit_user(&self, user_id: u64, changes: &UserDetails) -> Result<Value, ApiError> {
        let params = changes.build_edit_params()?;
        self.call_record(routes::EDIT_USER, &[user_id], &params)
    }

    pub fn list_user_entries(&self, user_id: u64, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_USER_ENTRIES, &[user_id], &params)
    }

    pub fn list_user_expenses(&self, user_id: u64, filter: &ExpenseFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_USER_EXPENSES, &[user_id], &params)
    }

    pub fn reactivate_user(&self, user_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::REACTIVATE_USER, &[user_id], &Params::new())
    }

    pub fn deactivate_user(&self, user_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DEACTIVATE_USER, &[user_id], &Params::new())
    }

    /// Only users without entries or expenses can be deleted; deactivate the rest.
    pub fn delete_user(&self, user_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_USER, &[user_id], &Params::new())
    }
}
