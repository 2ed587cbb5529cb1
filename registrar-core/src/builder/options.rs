//! Options consumed by a single `build` call

use crate::{Error, Result, Value};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Direction of the ORDER BY column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(Error::invalid_options(format!("unknown sort direction '{s}'")))
        }
    }
}

/// Fields, target, conditions and values for one statement.
///
/// Condition and ordering entries keep insertion order; setting a field that is
/// already present replaces its value in place.
///
/// # Examples
/// ```
/// use registrar_core::{BuildOptions, SortDirection};
///
/// let options = BuildOptions::new("users")
///     .fields(["id", "name"])
///     .equal("status", "active")
///     .order_by("id", SortDirection::Desc)
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "RawOptions")]
pub struct BuildOptions {
    pub fields: Vec<String>,
    pub database: Option<String>,
    pub table: String,
    pub equal: Vec<(String, Value)>,
    pub not_equal: Vec<(String, Value)>,
    pub order_by: Vec<(String, SortDirection)>,
    pub limit: Option<u64>,
    pub values: Option<Vec<Value>>,
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

impl BuildOptions {
    /// Options targeting `table`
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Self::default()
        }
    }

    /// Parse the loosely-typed JSON form, e.g.
    /// `{"table": "t", "equal": {"a": "1"}, "order_by": {"b": "ASC"}}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(json)?)
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        upsert(&mut self.equal, field.to_string(), value.into());
        self
    }

    pub fn not_equal(mut self, field: &str, value: impl Into<Value>) -> Self {
        upsert(&mut self.not_equal, field.to_string(), value.into());
        self
    }

    /// Only the first ORDER BY entry is rendered
    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        upsert(&mut self.order_by, field.to_string(), direction);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawOptions {
    fields: Option<OneOrMany>,
    database: Option<String>,
    table: Option<String>,
    equal: serde_json::Map<String, serde_json::Value>,
    not_equal: serde_json::Map<String, serde_json::Value>,
    order_by: serde_json::Map<String, serde_json::Value>,
    limit: Option<u64>,
    values: Option<Vec<serde_json::Value>>,
}

impl TryFrom<RawOptions> for BuildOptions {
    type Error = Error;

    fn try_from(raw: RawOptions) -> Result<Self> {
        let fields = match raw.fields {
            None => Vec::new(),
            Some(OneOrMany::One(field)) if field.is_empty() => Vec::new(),
            Some(OneOrMany::One(field)) => vec![field],
            Some(OneOrMany::Many(fields)) => fields,
        };

        let order_by = raw
            .order_by
            .into_iter()
            .map(|(field, direction)| match direction {
                serde_json::Value::String(dir) => Ok((field, dir.parse::<SortDirection>()?)),
                other => Err(Error::invalid_options(format!(
                    "sort direction for '{field}' must be a string, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            fields,
            database: raw.database,
            table: raw.table.unwrap_or_default(),
            equal: raw.equal.into_iter().map(|(k, v)| (k, v.into())).collect(),
            not_equal: raw.not_equal.into_iter().map(|(k, v)| (k, v.into())).collect(),
            order_by,
            limit: raw.limit,
            values: raw
                .values
                .map(|values| values.into_iter().map(Value::from).collect()),
        })
    }
}
