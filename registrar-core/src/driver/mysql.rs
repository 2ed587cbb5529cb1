//! MySQL driver backed by `sqlx`

use super::{ConnectTarget, Driver};
use crate::sanitize::{escape_string, EscapeMode};
use crate::{Error, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection};
use std::time::Duration;

const DEFAULT_PORT: u16 = 3306;

/// A live MySQL connection together with the escape mode its session needs
#[derive(Debug)]
pub struct MySqlHandle {
    conn: MySqlConnection,
    escape_mode: EscapeMode,
}

impl MySqlHandle {
    /// Borrow the underlying connection to run statements
    pub fn connection(&mut self) -> &mut MySqlConnection {
        &mut self.conn
    }

    pub fn escape_mode(&self) -> EscapeMode {
        self.escape_mode
    }
}

/// Opens connections with `sqlx::MySqlConnection`
#[derive(Debug, Clone, Default)]
pub struct MySqlDriver {
    connect_timeout: Option<Duration>,
}

impl MySqlDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up on `open` after `timeout`
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    async fn open_inner(&self, target: &ConnectTarget) -> Result<MySqlHandle> {
        let (host, port) = split_host_port(&target.hostname)?;
        let options = MySqlConnectOptions::new()
            .host(host)
            .port(port)
            .username(&target.username)
            .password(&target.password);

        let mut conn = options.connect().await?;

        let (sql_mode,): (String,) = sqlx::query_as("SELECT CAST(@@SESSION.sql_mode AS CHAR)")
            .fetch_one(&mut conn)
            .await?;

        Ok(MySqlHandle {
            conn,
            escape_mode: escape_mode_for(&sql_mode),
        })
    }
}

impl Driver for MySqlDriver {
    type Handle = MySqlHandle;

    async fn open(&self, target: &ConnectTarget) -> Result<MySqlHandle> {
        match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, self.open_inner(target))
                .await
                .map_err(|_| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("connecting to {} timed out", target.hostname),
                    ))
                })?,
            None => self.open_inner(target).await,
        }
    }

    async fn close(&self, handle: MySqlHandle) -> Result<()> {
        handle.conn.close().await?;
        Ok(())
    }

    fn escape(&self, handle: &MySqlHandle, text: &str) -> String {
        escape_string(text, handle.escape_mode)
    }
}

/// Accepts `host` or `host:port`
fn split_host_port(hostname: &str) -> Result<(&str, u16)> {
    match hostname.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port
                .parse::<u16>()
                .map_err(|_| Error::invalid_options(format!("invalid port in '{hostname}'")))?;
            Ok((host, port))
        }
        Some(_) => Err(Error::field("hostname")),
        None => Ok((hostname, DEFAULT_PORT)),
    }
}

fn escape_mode_for(sql_mode: &str) -> EscapeMode {
    let no_backslash = sql_mode
        .split(',')
        .any(|mode| mode.trim().eq_ignore_ascii_case("NO_BACKSLASH_ESCAPES"));
    if no_backslash {
        EscapeMode::QuoteDoubling
    } else {
        EscapeMode::Backslash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("localhost").unwrap(), ("localhost", 3306));
        assert_eq!(split_host_port("db.internal:3307").unwrap(), ("db.internal", 3307));
        assert!(matches!(
            split_host_port("db:port").unwrap_err(),
            Error::InvalidOptions { .. }
        ));
        assert_eq!(split_host_port(":3306").unwrap_err().field_name(), Some("hostname"));
    }

    #[test]
    fn test_escape_mode_from_sql_mode() {
        assert_eq!(
            escape_mode_for("STRICT_TRANS_TABLES,NO_ENGINE_SUBSTITUTION"),
            EscapeMode::Backslash
        );
        assert_eq!(
            escape_mode_for("ANSI_QUOTES, NO_BACKSLASH_ESCAPES"),
            EscapeMode::QuoteDoubling
        );
        assert_eq!(escape_mode_for(""), EscapeMode::Backslash);
    }
}
