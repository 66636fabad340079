//! One module per API resource.
//!
//! Each module defines the typed filter and detail structs for its resource
//! and adds the matching methods to [`NokoClient`](crate::NokoClient). Every
//! method validates its arguments into [`Params`] first, so an invalid call
//! never reaches the transport.

pub mod entries;
pub mod expenses;
pub mod invoices;
pub mod project_groups;
pub mod projects;
pub mod tags;
pub mod teams;
pub mod users;

use crate::error::ValidationError;
use crate::params::{IdList, Params};

/// A parameter set holding one ID list, for the bulk endpoints.
pub(crate) fn id_params(key: &'static str, ids: impl Into<IdList>) -> Result<Params, ValidationError> {
    let mut params = Params::new();
    params.ids(key, Some(&ids.into()))?;
    Ok(params)
}
