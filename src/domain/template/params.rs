//! Query parameter substitution with SQL-safe value rendering
//!
//! Templates reference parameters by an opaque token such as `$CUSTOMER_ID$`.
//! Every occurrence of a token is replaced by the rendered value; tokens are
//! applied in the order the parameters were inserted.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Value literal passed through unquoted, meaning "most recent row"
pub const LATEST: &str = "LATEST";

/// A single query parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(DateTime<Utc>),
}

impl QueryParam {
    /// Render the value as a SQL literal
    pub fn to_sql(&self) -> String {
        match self {
            Self::Text(value) if value == LATEST => value.clone(),
            Self::Text(value) => escape_sql_string(value),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) if value.is_finite() => value.to_string(),
            Self::Float(value) => escape_sql_string(&value.to_string()),
            Self::Date(value) => {
                escape_sql_string(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }

    /// Parse a loosely typed value: integer, finite float, RFC 3339 date, else text
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(value) = raw.parse::<i64>() {
            return Self::Integer(value);
        }

        if let Ok(value) = raw.parse::<f64>() {
            if value.is_finite() {
                return Self::Float(value);
            }
        }

        if let Ok(value) = DateTime::parse_from_rfc3339(raw) {
            return Self::Date(value.with_timezone(&Utc));
        }

        Self::Text(raw.to_string())
    }
}

impl From<&str> for QueryParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for QueryParam {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for QueryParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<DateTime<Utc>> for QueryParam {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// Quote a string as a MySQL-compatible literal
pub fn escape_sql_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');

    for c in value.chars() {
        match c {
            '\0' => escaped.push_str("\\0"),
            '\u{8}' => escaped.push_str("\\b"),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{1a}' => escaped.push_str("\\Z"),
            '"' => escaped.push_str("\\\""),
            '\'' => escaped.push_str("\\'"),
            '\\' => escaped.push_str("\\\\"),
            other => escaped.push(other),
        }
    }

    escaped.push('\'');
    escaped
}

/// Ordered token → value map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, QueryParam)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, token: impl Into<String>, value: impl Into<QueryParam>) -> Self {
        self.insert(token, value);
        self
    }

    /// Insert a value; an existing token keeps its position
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<QueryParam>) {
        let token = token.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == token) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((token, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryParam)> {
        self.entries.iter().map(|(token, value)| (token.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<QueryParam>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (token, value) in iter {
            params.insert(token, value);
        }
        params
    }
}

/// A WHERE template: one condition or an ordered list of conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhereClause {
    Single(String),
    Many(Vec<String>),
}

impl Default for WhereClause {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl WhereClause {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(condition) => condition.trim().is_empty(),
            Self::Many(conditions) => conditions.iter().all(|c| c.trim().is_empty()),
        }
    }

    /// Conditions in order, blank ones dropped
    pub fn conditions(&self) -> Vec<&str> {
        match self {
            Self::Single(condition) => vec![condition.as_str()],
            Self::Many(conditions) => conditions.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .filter(|c| !c.trim().is_empty())
        .collect()
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conditions().join(" AND "))
    }
}

/// Substitute every parameter token in a single template string
pub fn substitute_str(template: &str, params: &QueryParams) -> String {
    params
        .iter()
        .fold(template.to_string(), |acc, (token, value)| {
            if token.is_empty() {
                acc
            } else {
                acc.replace(token, &value.to_sql())
            }
        })
}

/// Substitute parameters into a WHERE template, preserving its shape
pub fn substitute_params(template: &WhereClause, params: &QueryParams) -> WhereClause {
    match template {
        WhereClause::Single(condition) => WhereClause::Single(substitute_str(condition, params)),
        WhereClause::Many(conditions) => WhereClause::Many(
            conditions
                .iter()
                .map(|condition| substitute_str(condition, params))
                .collect(),
        ),
    }
}
