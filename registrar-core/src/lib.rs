//! Registrar Core - a connection registry paired with a small MySQL statement builder
//!
//! A [`Registry`] hands out short connection ids, remembers a default database,
//! a default field list and a cache of named queries per connection, and builds
//! SELECT/INSERT text from [`BuildOptions`] with every value escaped for the
//! target connection.

pub mod builder;
pub mod config;
pub mod driver;
pub mod error;
pub mod registry;
pub mod sanitize;
pub mod value;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use builder::{BuildOptions, SortDirection, Statement, StatementKind};
pub use config::Config;
pub use driver::{ConnectTarget, Driver};
pub use error::{Error, Result};
pub use registry::{ConnectOptions, ConnectionRecord, Registry};
pub use sanitize::{EscapeMode, Sanitizer, TagPolicy};
pub use value::Value;
