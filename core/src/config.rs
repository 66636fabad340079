//! Client configuration.
//!
//! Configuration comes from the environment (`NOKO_ACCESS_TOKEN`,
//! `NOKO_BASE_URL`, `NOKO_PAGE_SIZE`) or is assembled in code. Empty
//! variables count as unset.

use secrecy::SecretString;

/// Base URL of the Noko v2 API.
pub const DEFAULT_BASE_URL: &str = "https://api.nokotime.com/v2";

/// Records requested per page by list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest `per_page` the API honours; bigger requests are served 1000 at a time.
pub const MAX_PAGE_SIZE: u32 = 1000;

pub const ACCESS_TOKEN_VAR: &str = "NOKO_ACCESS_TOKEN";
pub const BASE_URL_VAR: &str = "NOKO_BASE_URL";
pub const PAGE_SIZE_VAR: &str = "NOKO_PAGE_SIZE";

/// Errors that can occur while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// A variable is set but its value is unusable.
    #[error("environment variable {name} is invalid: {reason}")]
    Invalid {
        /// The offending variable.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Settings for a [`NokoClient`](crate::NokoClient).
#[derive(Debug)]
pub struct ClientConfig {
    /// Personal access token, sent as `X-FreckleToken`.
    pub access_token: SecretString,
    /// Overrides [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// Overrides [`DEFAULT_PAGE_SIZE`].
    pub page_size: Option<u32>,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            base_url: None,
            page_size: None,
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] if `NOKO_ACCESS_TOKEN` is unset and
    /// [`ConfigError::Invalid`] if `NOKO_PAGE_SIZE` is not an integer between
    /// 1 and [`MAX_PAGE_SIZE`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let access_token = read(ACCESS_TOKEN_VAR).ok_or(ConfigError::Missing(ACCESS_TOKEN_VAR))?;
        let page_size = read(PAGE_SIZE_VAR)
            .map(|raw| match raw.trim().parse::<u32>() {
                Ok(size) if (1..=MAX_PAGE_SIZE).contains(&size) => Ok(size),
                Ok(size) if size > MAX_PAGE_SIZE => Err(ConfigError::Invalid {
                    name: PAGE_SIZE_VAR,
                    reason: format!("{size} exceeds the maximum of {MAX_PAGE_SIZE}"),
                }),
                _ => Err(ConfigError::Invalid {
                    name: PAGE_SIZE_VAR,
                    reason: format!("`{raw}` is not a positive integer"),
                }),
            })
            .transpose()?;

        Ok(Self {
            access_token: SecretString::from(access_token),
            base_url: read(BASE_URL_VAR),
            page_size,
        })
    }
}
