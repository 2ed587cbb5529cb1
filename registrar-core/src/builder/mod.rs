//! Statement builder module
//!
//! Turns a [`StatementKind`] plus [`BuildOptions`] into MySQL statement text.
//! Identifiers are backtick-quoted and every interpolated value goes through the
//! escape function supplied by the caller, normally the registry's sanitizer
//! combined with the connection's driver.

pub mod insert;
pub mod options;
pub mod select;

pub use options::{BuildOptions, SortDirection};

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The kinds of statement `build` recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Delete,
    Update,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Delete => "delete",
            StatementKind::Update => "update",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "select" => Ok(StatementKind::Select),
            "insert" => Ok(StatementKind::Insert),
            "delete" => Ok(StatementKind::Delete),
            "update" => Ok(StatementKind::Update),
            _ => Err(Error::unsupported_kind(s)),
        }
    }
}

/// Result of a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Generated statement text
    Sql(String),
    /// A recognized kind with no generator yet; renders as empty text
    NotYetImplemented(StatementKind),
}

impl Statement {
    /// Statement text, empty for kinds without a generator
    pub fn as_sql(&self) -> &str {
        match self {
            Statement::Sql(sql) => sql,
            Statement::NotYetImplemented(_) => "",
        }
    }

    pub fn into_sql(self) -> String {
        match self {
            Statement::Sql(sql) => sql,
            Statement::NotYetImplemented(_) => String::new(),
        }
    }

    pub fn is_implemented(&self) -> bool {
        matches!(self, Statement::Sql(_))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Fallbacks for options left empty, taken from the target connection and the config
#[derive(Debug, Clone, Copy)]
pub struct Defaults<'a> {
    pub database: &'a str,
    pub fields: &'a [String],
    pub limit: u64,
}

/// Options after defaults have been applied
#[derive(Debug)]
pub(crate) struct Resolved<'a> {
    pub fields: &'a [String],
    pub database: &'a str,
    pub table: &'a str,
    pub limit: u64,
}

impl<'a> Resolved<'a> {
    fn new(options: &'a BuildOptions, defaults: &Defaults<'a>) -> Result<Self> {
        let fields = if options.fields.is_empty() {
            defaults.fields
        } else {
            options.fields.as_slice()
        };

        let database = match options.database.as_deref() {
            Some(db) if !db.is_empty() => db,
            _ => defaults.database,
        };

        if options.table.trim().is_empty() {
            return Err(Error::field("table"));
        }

        let limit = match options.limit {
            Some(limit) if limit > 0 => limit,
            _ => defaults.limit,
        };

        Ok(Self {
            fields,
            database,
            table: &options.table,
            limit,
        })
    }

    /// `` `database`.`table` ``
    pub fn target(&self) -> String {
        format!("{}.{}", quote_ident(self.database), quote_ident(self.table))
    }
}

/// Backtick-quote an identifier, doubling embedded backticks. `*` stays bare.
pub fn quote_ident(name: &str) -> String {
    if name == "*" {
        return name.to_string();
    }
    format!("`{}`", name.replace('`', "``"))
}

pub(crate) fn is_wildcard(fields: &[String]) -> bool {
    matches!(fields, [only] if only == "*")
}

/// Comma-joined quoted identifiers, e.g. `` `x`,`y` ``
pub(crate) fn field_list(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| quote_ident(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Generates statement text from options
pub struct StatementBuilder<'a> {
    defaults: Defaults<'a>,
    escape: &'a (dyn Fn(&str) -> String + 'a),
    escape_insert_values: bool,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(defaults: Defaults<'a>, escape: &'a (dyn Fn(&str) -> String + 'a)) -> Self {
        Self {
            defaults,
            escape,
            escape_insert_values: true,
        }
    }

    /// Pass INSERT values through verbatim instead of escaping them
    pub fn raw_insert_values(mut self, raw: bool) -> Self {
        self.escape_insert_values = !raw;
        self
    }

    pub fn build(&self, kind: StatementKind, options: &BuildOptions) -> Result<Statement> {
        let resolved = Resolved::new(options, &self.defaults)?;

        let statement = match kind {
            StatementKind::Select => {
                Statement::Sql(select::render(&resolved, options, self.escape)?)
            }
            StatementKind::Insert => {
                let verbatim = |text: &str| text.to_string();
                let escape: &dyn Fn(&str) -> String = if self.escape_insert_values {
                    self.escape
                } else {
                    &verbatim
                };
                Statement::Sql(insert::render(&resolved, options, escape)?)
            }
            StatementKind::Delete | StatementKind::Update => Statement::NotYetImplemented(kind),
        };

        Ok(statement)
    }
}
