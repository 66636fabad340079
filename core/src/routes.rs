//! Endpoint table for the Noko v2 API.
//!
//! Each resource operation is one row: HTTP method, a path template whose
//! `:name` segments are filled with IDs in order, and the list encoding the
//! endpoint expects for query parameters. `NokoClient` dispatches every
//! resource call through this table.

use crate::http::HttpMethod;
use crate::params::ListEncoding;

/// One API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub template: &'static str,
    pub encoding: ListEncoding,
}

impl Route {
    pub const fn new(method: HttpMethod, template: &'static str) -> Self {
        Self {
            method,
            template,
            encoding: ListEncoding::Joined,
        }
    }

    /// Expand the template, substituting `ids` into `:name` segments in order.
    ///
    /// A placeholder with no ID left is kept verbatim, which the server
    /// answers with a 404 rather than hitting an unrelated resource.
    #[must_use]
    pub fn path(&self, ids: &[u64]) -> String {
        let mut ids = ids.iter();
        self.template
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(_) => ids
                    .next()
                    .map_or_else(|| segment.to_string(), u64::to_string),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

macro_rules! route_table {
    ($($name:ident => $method:ident $template:literal),+ $(,)?) => {
        $(pub const $name: Route = Route::new(HttpMethod::$method, $template);)+

        /// Every endpoint, keyed by its constant name.
        pub const ALL: &[(&str, Route)] = &[$((stringify!($name), $name)),+];
    };
}

route_table! {
    LIST_ENTRIES => Get "entries",
    GET_ENTRY => Get "entries/:id",
    CREATE_ENTRY => Post "entries",
    EDIT_ENTRY => Put "entries/:id",
    MARK_ENTRY_INVOICED => Put "entries/:id/mark_as_invoiced",
    MARK_ENTRIES_INVOICED => Put "entries/mark_as_invoiced",
    MARK_ENTRY_APPROVED => Put "entries/:id/approved",
    MARK_ENTRIES_APPROVED => Put "entries/approved",
    MARK_ENTRY_UNAPPROVED => Put "entries/:id/unapproved",
    MARK_ENTRIES_UNAPPROVED => Put "entries/unapproved",
    DELETE_ENTRY => Delete "entries/:id",

    LIST_TAGS => Get "tags",
    CREATE_TAGS => Post "tags",
    GET_TAG => Get "tags/:id",
    LIST_TAG_ENTRIES => Get "tags/:id/entries",
    EDIT_TAG => Put "tags/:id",
    MERGE_TAGS => Put "tags/:id/merge",
    DELETE_TAG => Delete "tags/:id",
    DELETE_TAGS => Delete "tags/delete",

    LIST_PROJECTS => Get "projects",
    GET_PROJECT => Get "projects/:id",
    CREATE_PROJECT => Post "projects",
    LIST_PROJECT_ENTRIES => Get "projects/:id/entries",
    LIST_PROJECT_EXPENSES => Get "projects/:id/expenses",
    EDIT_PROJECT => Put "projects/:id",
    MERGE_PROJECTS => Put "projects/:id/merge",
    DELETE_PROJECT => Delete "projects/:id",
    ARCHIVE_PROJECT => Put "projects/:id/archive",
    UNARCHIVE_PROJECT => Put "projects/:id/unarchive",
    ARCHIVE_PROJECTS => Put "projects/archive",
    UNARCHIVE_PROJECTS => Put "projects/unarchive",
    DELETE_PROJECTS => Put "projects/delete",

    LIST_PROJECT_GROUPS => Get "project_groups",
    CREATE_PROJECT_GROUP => Post "project_groups",
    GET_PROJECT_GROUP => Get "project_groups/:id",
    EDIT_PROJECT_GROUP => Put "project_groups/:id",
    LIST_PROJECT_GROUP_ENTRIES => Get "project_groups/:id/entries",
    LIST_PROJECT_GROUP_PROJECTS => Get "project_groups/:id/projects",
    ADD_PROJECTS_TO_GROUP => Post "project_groups/:id/add_projects",
    REMOVE_PROJECTS_FROM_GROUP => Put "project_groups/:id/remove_projects",
    REMOVE_ALL_PROJECTS_FROM_GROUP => Put "project_groups/:id/remove_all_projects",
    DELETE_PROJECT_GROUP => Delete "project_groups/:id",

    LIST_INVOICES => Get "invoices",
    GET_INVOICE => Get "invoices/:id",
    CREATE_INVOICE => Post "invoices",
    EDIT_INVOICE => Put "invoices/:id",
    MARK_INVOICE_PAID => Put "invoices/:id/paid",
    MARK_INVOICE_UNPAID => Put "invoices/:id/unpaid",
    LIST_INVOICE_ENTRIES => Get "invoices/:id/entries",
    LIST_INVOICE_EXPENSES => Get "invoices/:id/expenses",
    DELETE_INVOICE => Delete "invoices/:id",

    LIST_EXPENSES => Get "expenses",
    GET_EXPENSE => Get "expenses/:id",
    CREATE_EXPENSE => Post "expenses",
    EDIT_EXPENSE => Put "expenses/:id",
    DELETE_EXPENSE => Delete "expenses/:id",

    LIST_USERS => Get "users",
    GET_USER => Get "users/:id",
    CREATE_USER => Post "users",
    EDIT_USER => Put "users/:id",
    LIST_USER_ENTRIES => Get "users/:id/entries",
    LIST_USER_EXPENSES => Get "users/:id/expenses",
    REACTIVATE_USER => Put "users/:id/reactivate",
    DEACTIVATE_USER => Put "users/:id/deactivate",
    DELETE_USER => Delete "users/:id",

    LIST_TEAMS => Get "teams",
    GET_TEAM => Get "teams/:id",
    CREATE_TEAM => Post "teams",
    EDIT_TEAM => Put "teams/:id",
    LIST_TEAM_ENTRIES => Get "teams/:id/entries",
    LIST_TEAM_USERS => Get "teams/:id/users",
    ADD_USERS_TO_TEAM => Post "teams/:id/add_users",
    REMOVE_USERS_FROM_TEAM => Put "teams/:id/remove_users",
    REMOVE_ALL_USERS_FROM_TEAM => Put "teams/:id/remove_all_users",
    DELETE_TEAM => Delete "teams/:id",
}

/// Look up a route by its constant name, e.g. `"LIST_ENTRIES"`.
#[must_use]
pub fn by_name(name: &str) -> Option<Route> {
    ALL.iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, route)| *route)
}
