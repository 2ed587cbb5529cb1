//! Registry of named connections and their per-connection defaults
//!
//! Each live connection is a [`ConnectionRecord`]: the driver handle, the
//! default database, the default field list and a cache of named queries. All
//! four live in one record, so they are created and removed together.

use crate::builder::{BuildOptions, Defaults, Statement, StatementBuilder, StatementKind};
use crate::driver::{ConnectTarget, Driver};
use crate::sanitize::{Sanitizer, TagPolicy};
use crate::{Config, Error, Result, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// One logical connection owned by the registry
#[derive(Debug)]
pub struct ConnectionRecord<H> {
    id: String,
    generation: u64,
    handle: Option<H>,
    database: String,
    default_fields: Vec<String>,
    named_queries: HashMap<String, String>,
}

impl<H> ConnectionRecord<H> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The driver handle; `None` while `connect` is still opening it
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    pub fn into_handle(self) -> Option<H> {
        self.handle
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn default_fields(&self) -> &[String] {
        &self.default_fields
    }

    pub fn named_query(&self, key: &str) -> Option<&str> {
        self.named_queries.get(key).map(String::as_str)
    }

    pub fn named_queries(&self) -> &HashMap<String, String> {
        &self.named_queries
    }
}

/// Arguments to [`Registry::connect`]
///
/// # Examples
/// ```
/// use registrar_core::ConnectOptions;
///
/// let options = ConnectOptions::new("localhost", "app", "secret", "shop")
///     .with_fields(["id", "name"])
///     .with_query("all_users", "SELECT * FROM `shop`.`users`");
/// ```
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    target: ConnectTarget,
    database: String,
    id: Option<String>,
    fields: Option<Vec<String>>,
    query: Option<(String, String)>,
}

impl ConnectOptions {
    pub fn new(
        hostname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            target: ConnectTarget::new(hostname, username, password),
            database: database.into(),
            id: None,
            fields: None,
            query: None,
        }
    }

    /// Register under this id instead of a generated one. A blank id is ignored.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Default field list for statements built on this connection
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Seed the named query cache with one entry
    pub fn with_query(mut self, key: impl Into<String>, sql: impl Into<String>) -> Self {
        self.query = Some((key.into(), sql.into()));
        self
    }
}

#[derive(Debug)]
struct RegistryState<H> {
    records: HashMap<String, ConnectionRecord<H>>,
    next_generation: u64,
}

impl<H> RegistryState<H> {
    /// Letters counted from the number of live connections: a..z, then aa, ab, ...
    /// Skips ids still in use after out-of-order closes.
    fn next_id(&self) -> String {
        let mut index = self.records.len();
        loop {
            let candidate = id_for_index(index);
            if !self.records.contains_key(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Remove `id` only if it is still the record registered under `generation`
    fn remove_generation(&mut self, id: &str, generation: u64) {
        if self.records.get(id).is_some_and(|r| r.generation == generation) {
            self.records.remove(id);
        }
    }
}

/// Removes a half-registered record when `connect` is dropped or fails before
/// the handle is attached
struct PendingRecord<'a, H> {
    state: &'a Mutex<RegistryState<H>>,
    id: String,
    generation: u64,
    armed: bool,
}

impl<H> PendingRecord<'_, H> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<H> Drop for PendingRecord<'_, H> {
    fn drop(&mut self) {
        if self.armed {
            self.state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove_generation(&self.id, self.generation);
        }
    }
}

fn id_for_index(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'a' + (index % 26) as u8));
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Process-wide table of connections keyed by connection id
pub struct Registry<D: Driver> {
    driver: D,
    config: Config,
    sanitizer: Sanitizer,
    state: Mutex<RegistryState<D::Handle>>,
}

impl<D: Driver> Registry<D> {
    /// Create an empty registry with the default configuration
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, Config::default())
    }

    pub fn with_config(driver: D, config: Config) -> Self {
        Self {
            driver,
            sanitizer: Sanitizer::new(&config),
            config,
            state: Mutex::new(RegistryState {
                records: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<D::Handle>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The id the next generated connection will receive
    pub fn next_connection_id(&self) -> String {
        self.lock().next_id()
    }

    /// `false` when the value's text is whitespace only
    pub fn is_non_blank(&self, value: &Value) -> bool {
        self.sanitizer.is_non_blank(value)
    }

    fn validate(&self, options: &ConnectOptions) -> Result<()> {
        let required = [
            ("hostname", &options.target.hostname),
            ("username", &options.target.username),
            ("password", &options.target.password),
            ("database", &options.database),
        ];
        for (name, value) in required {
            if !self.sanitizer.is_non_blank_str(value) {
                return Err(Error::field(name));
            }
        }

        if let Some(fields) = &options.fields {
            if fields.is_empty() || !fields.iter().all(|f| self.sanitizer.is_non_blank_str(f)) {
                return Err(Error::field("fields"));
            }
        }

        if let Some((key, sql)) = &options.query {
            if !self.sanitizer.is_non_blank_str(key) || !self.sanitizer.is_non_blank_str(sql) {
                return Err(Error::field("query"));
            }
        }

        Ok(())
    }

    /// Validate, register and open a connection, returning its id.
    ///
    /// The record is registered before the handle is opened. If the driver fails,
    /// the record is removed again and [`Error::HandleOpen`] is returned. Dropping
    /// the future before the handle is attached also removes the record.
    pub async fn connect(&self, options: ConnectOptions) -> Result<String> {
        self.validate(&options)?;

        let ConnectOptions {
            target,
            database,
            id: requested,
            fields,
            query,
        } = options;

        let requested = requested.filter(|id| self.sanitizer.is_non_blank_str(id));
        let default_fields = fields.unwrap_or_else(|| self.config.default_fields.clone());
        let named_queries: HashMap<String, String> = query.into_iter().collect();

        let (id, generation) = {
            let mut state = self.lock();
            let id = match requested {
                Some(id) if state.records.contains_key(&id) => {
                    return Err(Error::duplicate_connection(id));
                }
                Some(id) => id,
                None => state.next_id(),
            };
            let generation = state.next_generation;
            state.next_generation += 1;
            state.records.insert(
                id.clone(),
                ConnectionRecord {
                    id: id.clone(),
                    generation,
                    handle: None,
                    database,
                    default_fields,
                    named_queries,
                },
            );
            (id, generation)
        };

        let mut pending = PendingRecord {
            state: &self.state,
            id: id.clone(),
            generation,
            armed: true,
        };

        debug!(conn_id = %id, hostname = %target.hostname, "opening connection");

        let handle = match self.driver.open(&target).await {
            Ok(handle) => handle,
            Err(err) => {
                drop(pending);
                debug!(conn_id = %id, error = %err, "connection failed, registration dropped");
                return Err(Error::handle_open(id, err));
            }
        };

        let orphan = {
            let mut state = self.lock();
            let attached = match state.records.get_mut(&id) {
                Some(record) if record.generation == generation => {
                    record.handle = Some(handle);
                    pending.disarm();
                    None
                }
                _ => Some(handle),
            };
            attached
        };

        if let Some(handle) = orphan {
            warn!(conn_id = %id, "connection closed while opening, discarding handle");
            if let Err(err) = self.driver.close(handle).await {
                warn!(conn_id = %id, error = %err, "failed to close discarded handle");
            }
            return Err(Error::unknown_connection(id));
        }

        debug!(conn_id = %id, "connection registered");
        Ok(id)
    }

    /// Remove every entry for `id` and hand the record back without touching its handle
    pub fn delete_connection(&self, id: &str) -> Result<ConnectionRecord<D::Handle>> {
        let record = self
            .lock()
            .records
            .remove(id)
            .ok_or_else(|| Error::unknown_connection(id))?;
        debug!(conn_id = %id, "connection deleted");
        Ok(record)
    }

    /// Close the handle for `id` and remove its entries.
    ///
    /// The entries are removed even when the driver fails to close the handle.
    pub async fn close(&self, id: &str) -> Result<()> {
        let record = self.delete_connection(id)?;
        let Some(handle) = record.into_handle() else {
            return Ok(());
        };
        self.driver.close(handle).await.map_err(|err| {
            warn!(conn_id = %id, error = %err, "failed to close connection");
            Error::handle_close(id, err)
        })
    }

    /// Close every connection concurrently and empty the registry.
    ///
    /// All handles are closed; the first failure is returned.
    pub async fn close_all(&self) -> Result<()> {
        let records: Vec<_> = self.lock().records.drain().map(|(_, r)| r).collect();
        debug!(count = records.len(), "closing all connections");

        let closing = records.into_iter().filter_map(|record| {
            let id = record.id.clone();
            record.into_handle().map(|handle| async move {
                self.driver.close(handle).await.map_err(|err| {
                    warn!(conn_id = %id, error = %err, "failed to close connection");
                    Error::handle_close(id, err)
                })
            })
        });

        futures::future::join_all(closing)
            .await
            .into_iter()
            .collect::<Result<()>>()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().records.contains_key(id)
    }

    /// Ids of all registered connections, sorted
    pub fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().records.keys().cloned().collect();
        ids.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        ids
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn database(&self, id: &str) -> Result<String> {
        self.with_record(id, |record| record.database.clone())
    }

    pub fn default_fields(&self, id: &str) -> Result<Vec<String>> {
        self.with_record(id, |record| record.default_fields.clone())
    }

    /// Cached statement stored under `key` for connection `id`
    pub fn named_query(&self, id: &str, key: &str) -> Result<Option<String>> {
        self.with_record(id, |record| record.named_query(key).map(str::to_string))
    }

    /// Cache `sql` under `key`, replacing any previous entry
    pub fn store_query(&self, id: &str, key: &str, sql: impl Into<String>) -> Result<()> {
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| Error::unknown_connection(id))?;
        record.named_queries.insert(key.to_string(), sql.into());
        Ok(())
    }

    fn with_record<T>(&self, id: &str, f: impl FnOnce(&ConnectionRecord<D::Handle>) -> T) -> Result<T> {
        let state = self.lock();
        let record = state
            .records
            .get(id)
            .ok_or_else(|| Error::unknown_connection(id))?;
        Ok(f(record))
    }

    /// Escape `value` for connection `id`, optionally stripping markup first
    pub fn clean(&self, id: &str, value: &str, tags: TagPolicy) -> Result<String> {
        let state = self.lock();
        let handle = ready_handle(&state, id)?;
        Ok(self
            .sanitizer
            .clean(value, tags, |text| self.driver.escape(handle, text)))
    }

    /// Build a statement using the defaults registered for `id`
    pub fn build(&self, kind: StatementKind, options: &BuildOptions, id: &str) -> Result<Statement> {
        let state = self.lock();
        self.build_locked(&state, kind, options, id)
    }

    /// Build a statement and cache its text under `key` for connection `id`.
    ///
    /// Kinds without a generator are returned but not cached.
    pub fn build_and_store(
        &self,
        kind: StatementKind,
        options: &BuildOptions,
        id: &str,
        key: &str,
    ) -> Result<Statement> {
        let mut state = self.lock();
        let statement = self.build_locked(&state, kind, options, id)?;

        if let Statement::Sql(sql) = &statement {
            if let Some(record) = state.records.get_mut(id) {
                record.named_queries.insert(key.to_string(), sql.clone());
                debug!(conn_id = %id, key, "statement cached");
            }
        }

        Ok(statement)
    }

    fn build_locked(
        &self,
        state: &RegistryState<D::Handle>,
        kind: StatementKind,
        options: &BuildOptions,
        id: &str,
    ) -> Result<Statement> {
        let record = state
            .records
            .get(id)
            .ok_or_else(|| Error::unknown_connection(id))?;
        let handle = record
            .handle
            .as_ref()
            .ok_or_else(|| Error::connection_not_ready(id))?;

        let defaults = Defaults {
            database: &record.database,
            fields: &record.default_fields,
            limit: self.config.default_limit,
        };
        let escape = |text: &str| {
            self.sanitizer
                .clean(text, TagPolicy::Keep, |t| self.driver.escape(handle, t))
        };

        let statement = StatementBuilder::new(defaults, &escape)
            .raw_insert_values(self.config.legacy_insert_values)
            .build(kind, options)?;

        debug!(conn_id = %id, %kind, sql = %statement, "statement built");
        Ok(statement)
    }
}

fn ready_handle<'s, H>(state: &'s RegistryState<H>, id: &str) -> Result<&'s H> {
    state
        .records
        .get(id)
        .ok_or_else(|| Error::unknown_connection(id))?
        .handle
        .as_ref()
        .ok_or_else(|| Error::connection_not_ready(id))
}
