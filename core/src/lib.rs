//! Synchronous client for the Noko (formerly Freckle) time-tracking API.
//!
//! # Overview
//! Typed resource methods (entries, projects, tags, invoices, expenses,
//! users, teams, project groups) validate their arguments locally, build an
//! `HttpRequest`, hand it to a [`Transport`], and return the parsed JSON.
//! List operations walk every page before returning.
//!
//! # Design
//! - `NokoClient` is stateless between calls. It holds the base URL, the
//!   access token, the page size and a transport, all read-only.
//! - Every resource method goes through one row of the `routes` table and a
//!   generic dispatcher, so the per-resource modules only describe
//!   parameters.
//! - Validation runs before the request is built: an invalid argument set
//!   never reaches the network.
//! - `build_request` and `parse_response` are public so that callers can
//!   execute the round trip with their own HTTP stack.
//! - Records are returned as `serde_json::Value`, unchanged from the server.
//! - `FreckleClient` covers the legacy v1 API (account name plus token).

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod legacy;
pub mod params;
pub mod resources;
pub mod routes;

#[cfg(test)]
mod testing;

pub use client::{parse_response, NokoClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use legacy::FreckleClient;
pub use params::{DateInput, IdList, ListEncoding, ParamValue, Params, TimestampInput};
pub use resources::entries::{EntryDetails, EntryFilter, TagFilterType};
pub use resources::expenses::{ExpenseDetails, ExpenseFilter};
pub use resources::invoices::{InvoiceDetails, InvoiceFilter, InvoiceState, RateCalculation, RateMethod, Tax};
pub use resources::project_groups::{NewProjectGroup, ProjectGroupFilter};
pub use resources::projects::{ProjectDetails, ProjectFilter};
pub use resources::tags::TagFilter;
pub use resources::teams::{NewTeam, TeamFilter};
pub use resources::users::{UserDetails, UserFilter, UserRole, UserState};
