//! Error types for Registrar

use thiserror::Error;

/// The main error type for Registrar operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required input was blank or missing
    #[error("Field '{name}' is blank or missing")]
    Field { name: &'static str },

    /// The connection id is not present in the registry
    #[error("Unknown connection id '{id}'")]
    UnknownConnection { id: String },

    /// A caller-supplied connection id is already live
    #[error("Connection id '{id}' is already registered")]
    DuplicateConnection { id: String },

    /// The connection is registered but its handle is still being opened
    #[error("Connection '{id}' has no open handle yet")]
    ConnectionNotReady { id: String },

    /// The driver failed to open a handle after validation passed
    #[error("Failed to open connection '{id}': {source}")]
    HandleOpen {
        id: String,
        #[source]
        source: Box<Error>,
    },

    /// The driver failed to close a handle; the registry entry is gone regardless
    #[error("Failed to close connection '{id}': {source}")]
    HandleClose {
        id: String,
        #[source]
        source: Box<Error>,
    },

    /// The statement kind is not one of select, insert, delete, update
    #[error("Unsupported statement kind '{kind}'")]
    UnsupportedKind { kind: String },

    /// The options cannot produce a well-formed statement
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// The options structure could not be interpreted
    #[error("Invalid build options: {message}")]
    InvalidOptions { message: String },

    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for Registrar operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new blank-field error
    pub fn field(name: &'static str) -> Self {
        Self::Field { name }
    }

    /// Create a new unknown connection error
    pub fn unknown_connection(id: impl Into<String>) -> Self {
        Self::UnknownConnection { id: id.into() }
    }

    /// Create a new duplicate connection error
    pub fn duplicate_connection(id: impl Into<String>) -> Self {
        Self::DuplicateConnection { id: id.into() }
    }

    /// Create a new not-ready error
    pub fn connection_not_ready(id: impl Into<String>) -> Self {
        Self::ConnectionNotReady { id: id.into() }
    }

    /// Wrap a driver failure raised while opening a handle
    pub fn handle_open(id: impl Into<String>, source: Error) -> Self {
        Self::HandleOpen {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a driver failure raised while closing a handle
    pub fn handle_close(id: impl Into<String>, source: Error) -> Self {
        Self::HandleClose {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Create a new unsupported kind error
    pub fn unsupported_kind(kind: impl Into<String>) -> Self {
        Self::UnsupportedKind { kind: kind.into() }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new invalid options error
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Name of the blank field, if this is a field error
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            Self::Field { name } => Some(name),
            _ => None,
        }
    }
}
