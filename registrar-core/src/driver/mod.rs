//! Driver interface used by the registry to open, close and escape against real connections

#[cfg(feature = "mysql")]
pub mod mysql;

use crate::Result;
use std::fmt;
use std::future::Future;

/// Credentials handed to a driver when a connection is opened
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

impl ConnectTarget {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for ConnectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectTarget")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trait for database drivers
///
/// The registry owns every handle a driver returns and passes it back exactly
/// once to [`Driver::close`].
pub trait Driver: Send + Sync {
    /// The live connection type for this driver
    type Handle: Send;

    /// Open a connection to the server
    fn open(&self, target: &ConnectTarget) -> impl Future<Output = Result<Self::Handle>> + Send;

    /// Close a connection previously returned by `open`
    fn close(&self, handle: Self::Handle) -> impl Future<Output = Result<()>> + Send;

    /// Escape text for a quoted string literal, honoring the connection's settings
    fn escape(&self, handle: &Self::Handle, text: &str) -> String;
}
