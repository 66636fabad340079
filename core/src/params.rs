//! Validated parameter sets and the typed inputs that produce them.
//!
//! # Design
//! Every resource operation turns its typed argument struct into a
//! [`Params`] map before a request is built. Keys that are absent mean "not
//! specified" and are never sent as explicit nulls, so server-side defaults
//! stay in effect. Values keep their semantic type until the last moment:
//! the same `Ids` value becomes `1,2,3` in a query string and `[1,2,3]` in a
//! JSON body.
//!
//! Inputs that callers commonly hold as text (dates, timestamps, ID lists)
//! accept either a typed value or a string; strings are parsed here and
//! rejected with a [`ValidationError`] naming the field.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::error::ValidationError;

/// Wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Wire format for timestamps. Always UTC, second precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// How list values are written into a query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListEncoding {
    /// `key=1,2,3`
    Joined,
    /// `key=1&key=2&key=3`
    Repeated,
}

/// A single parameter value in its semantic (pre-wire) form.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Integer(u64),
    Number(f64),
    Flag(bool),
    Ids(Vec<u64>),
    Json(Value),
}

impl ParamValue {
    fn query_values(&self, encoding: ListEncoding) -> Vec<String> {
        match self {
            ParamValue::Text(text) => vec![text.clone()],
            ParamValue::Integer(n) => vec![n.to_string()],
            ParamValue::Number(n) => vec![n.to_string()],
            ParamValue::Flag(flag) => vec![flag.to_string()],
            ParamValue::Ids(ids) => match encoding {
                ListEncoding::Joined => vec![join_ids(ids)],
                ListEncoding::Repeated => ids.iter().map(u64::to_string).collect(),
            },
            ParamValue::Json(Value::String(text)) => vec![text.clone()],
            ParamValue::Json(value) => vec![value.to_string()],
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(text) => Value::String(text.clone()),
            ParamValue::Integer(n) => Value::from(*n),
            ParamValue::Number(n) => serde_json::Number::from_f64(*n).map_or(Value::Null, Value::Number),
            ParamValue::Flag(flag) => Value::Bool(*flag),
            ParamValue::Ids(ids) => Value::from(ids.clone()),
            ParamValue::Json(value) => value.clone(),
        }
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Integer(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Integer(u64::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<Vec<u64>> for ParamValue {
    fn from(value: Vec<u64>) -> Self {
        ParamValue::Ids(value)
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        ParamValue::Json(value)
    }
}

/// A validated parameter set: API parameter name to value.
///
/// Ordered by key so that encoded query strings and bodies are stable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: BTreeMap<String, ParamValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Insert `value` only when it is present.
    pub fn insert_opt<V: Into<ParamValue>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.insert(key, value);
        }
        self
    }

    /// Builder form of [`Params::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Encode as query string pairs.
    #[must_use]
    pub fn query_pairs(&self, encoding: ListEncoding) -> Vec<(String, String)> {
        self.values
            .iter()
            .flat_map(|(key, value)| {
                value
                    .query_values(encoding)
                    .into_iter()
                    .map(move |encoded| (key.clone(), encoded))
            })
            .collect()
    }

    /// Encode as a JSON object body.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let object: Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Value::Object(object)
    }

    /// Validate and insert an optional date, returning it for cross-field checks.
    pub(crate) fn date(
        &mut self,
        key: &'static str,
        input: Option<&DateInput>,
    ) -> Result<Option<NaiveDate>, ValidationError> {
        let Some(input) = input else {
            return Ok(None);
        };
        let date = input.resolve(key)?;
        self.insert(key, date.format(DATE_FORMAT).to_string());
        Ok(Some(date))
    }

    /// Validate and insert an optional timestamp, returning it for cross-field checks.
    pub(crate) fn timestamp(
        &mut self,
        key: &'static str,
        input: Option<&TimestampInput>,
    ) -> Result<Option<DateTime<Utc>>, ValidationError> {
        let Some(input) = input else {
            return Ok(None);
        };
        let timestamp = input.resolve(key)?;
        self.insert(key, timestamp.format(TIMESTAMP_FORMAT).to_string());
        Ok(Some(timestamp))
    }

    pub(crate) fn ids(&mut self, key: &'static str, input: Option<&IdList>) -> Result<(), ValidationError> {
        if let Some(input) = input {
            self.insert(key, input.resolve(key)?);
        }
        Ok(())
    }

    pub(crate) fn number(&mut self, key: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
        let Some(value) = value else {
            return Ok(None);
        };
        if !value.is_finite() {
            return Err(ValidationError::new(key, "must be a finite number"));
        }
        self.insert(key, value);
        Ok(Some(value))
    }

    pub(crate) fn text(&mut self, key: &'static str, value: Option<&String>) -> &mut Self {
        self.insert_opt(key, value.cloned())
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(",")
}

// ---------------------------------------------------------------------------
// Typed inputs
// ---------------------------------------------------------------------------

/// A calendar date, given either typed or as `YYYY-MM-DD` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateInput {
    Date(NaiveDate),
    Text(String),
}

impl DateInput {
    pub fn resolve(&self, field: &'static str) -> Result<NaiveDate, ValidationError> {
        match self {
            DateInput::Date(date) => Ok(*date),
            DateInput::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| {
                ValidationError::new(field, format!("`{text}` is not a YYYY-MM-DD date"))
            }),
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Date(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Date(value.date())
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(value: DateTime<Utc>) -> Self {
        DateInput::Date(value.date_naive())
    }
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

/// A point in time, given either typed or as ISO 8601 text.
///
/// Accepted text: RFC 3339 (`2023-08-01T10:00:00+02:00`),
/// `YYYY-MM-DDTHH:MM:SS` with or without a trailing `Z` (read as UTC), or a
/// bare `YYYY-MM-DD` (midnight UTC).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampInput {
    At(DateTime<Utc>),
    Text(String),
}

impl TimestampInput {
    pub fn resolve(&self, field: &'static str) -> Result<DateTime<Utc>, ValidationError> {
        match self {
            TimestampInput::At(at) => Ok(*at),
            TimestampInput::Text(text) => parse_timestamp(text.trim()).ok_or_else(|| {
                ValidationError::new(
                    field,
                    format!("`{text}` is not a YYYY-MM-DDTHH:MM:SSZ timestamp"),
                )
            }),
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }
    let naive = text.strip_suffix('Z').unwrap_or(text);
    if let Ok(at) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}

impl From<DateTime<Utc>> for TimestampInput {
    fn from(value: DateTime<Utc>) -> Self {
        TimestampInput::At(value)
    }
}

impl From<NaiveDateTime> for TimestampInput {
    fn from(value: NaiveDateTime) -> Self {
        TimestampInput::At(value.and_utc())
    }
}

impl From<&str> for TimestampInput {
    fn from(value: &str) -> Self {
        TimestampInput::Text(value.to_string())
    }
}

impl From<String> for TimestampInput {
    fn from(value: String) -> Self {
        TimestampInput::Text(value)
    }
}

/// One or more resource IDs, given typed or as comma-separated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdList {
    Ids(Vec<u64>),
    Text(String),
}

impl IdList {
    /// Resolve to integer IDs. An empty list is rejected: a filter on
    /// nothing is never what the caller meant.
    pub fn resolve(&self, field: &'static str) -> Result<Vec<u64>, ValidationError> {
        let ids = match self {
            IdList::Ids(ids) => ids.clone(),
            IdList::Text(text) if text.trim().is_empty() => Vec::new(),
            IdList::Text(text) => text
                .split(',')
                .map(|part| {
                    part.trim().parse::<u64>().map_err(|_| {
                        ValidationError::new(field, format!("`{}` is not an integer ID", part.trim()))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
        };
        if ids.is_empty() {
            return Err(ValidationError::new(field, "must contain at least one ID"));
        }
        Ok(ids)
    }
}

impl From<Vec<u64>> for IdList {
    fn from(value: Vec<u64>) -> Self {
        IdList::Ids(value)
    }
}

impl From<&[u64]> for IdList {
    fn from(value: &[u64]) -> Self {
        IdList::Ids(value.to_vec())
    }
}

impl<const N: usize> From<[u64; N]> for IdList {
    fn from(value: [u64; N]) -> Self {
        IdList::Ids(value.to_vec())
    }
}

impl From<u64> for IdList {
    fn from(value: u64) -> Self {
        IdList::Ids(vec![value])
    }
}

impl From<&str> for IdList {
    fn from(value: &str) -> Self {
        IdList::Text(value.to_string())
    }
}

impl From<String> for IdList {
    fn from(value: String) -> Self {
        IdList::Text(value)
    }
}

/// Declares a string-valued API enumeration with a closed wire set.
///
/// Parsing an unknown value fails with a [`ValidationError`] for `$field`.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident for $field:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Every accepted value, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::ValidationError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($wire => Ok($name::$variant),)+
                    other => Err($crate::error::ValidationError::new(
                        $field,
                        format!("`{other}` is not one of: {}", [$($wire),+].join(", ")),
                    )),
                }
            }
        }

        impl From<$name> for $crate::params::ParamValue {
            fn from(value: $name) -> Self {
                $crate::params::ParamValue::Text(value.as_str().to_string())
            }
        }
    };
}

pub(crate) use wire_enum;

// ---------------------------------------------------------------------------
// Cross-field checks
// ---------------------------------------------------------------------------

/// Fail with "is required" when a mandatory field is absent.
pub(crate) fn require<'a, T>(field: &'static str, value: Option<&'a T>) -> Result<&'a T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(field, "is required"))
}

/// Trimmed copy of `value`, or an error if nothing is left.
pub(crate) fn non_blank(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Fail when both bounds are present and `from` is after `to`.
pub(crate) fn check_range<T: PartialOrd + fmt::Display>(
    from_field: &'static str,
    from: Option<T>,
    to_field: &'static str,
    to: Option<T>,
) -> Result<(), ValidationError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ValidationError::new(
            from_field,
            format!("{from} is after `{to_field}` ({to})"),
        )),
        _ => Ok(()),
    }
}

/// Fail when two mutually exclusive fields are both present.
pub(crate) fn check_exclusive(
    field: &'static str,
    present: bool,
    other_field: &'static str,
    other_present: bool,
) -> Result<(), ValidationError> {
    if present && other_present {
        return Err(ValidationError::new(
            field,
            format!("cannot be combined with `{other_field}`"),
        ));
    }
    Ok(())
}
