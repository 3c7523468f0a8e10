//! The in-memory store and its connection.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use recordfs_core::{
    Connection, Connector, Credentials, Error, RecordHandle, RecordStore, Result, RpcResponder,
    RpcTransport, Url,
};
use recordfs_core::sync::lock;

use crate::record::MemoryRecord;

/// Error message reported for calls to an endpoint nobody provides.
pub const NO_RPC_PROVIDER: &str = "NO_RPC_PROVIDER";

#[derive(Default)]
struct Shared {
    records: Mutex<BTreeMap<String, Arc<MemoryRecord>>>,
    fetches: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, Error>>,
    providers: Mutex<HashMap<String, RpcResponder>>,
}

#[derive(Debug, Clone, Default)]
struct Options {
    fetch_delay: Option<Duration>,
    credentials: Option<Credentials>,
}

/// An in-memory record store.
///
/// Clones share the same records, so a test can keep one clone to seed and
/// inspect data while a client talks to another.
///
/// Fetching a record that does not exist creates it as an empty object,
/// the way a pub/sub store creates records on first use. Snapshots never
/// create records.
///
/// # Example
///
/// ```rust
/// use recordfs_memory::MemoryStore;
/// use serde_json::json;
///
/// let store = MemoryStore::new();
/// store.insert("users.alice", json!({"name": "Alice"}));
/// assert_eq!(store.value("users.alice"), Some(json!({"name": "Alice"})));
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
    options: Options,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every record fetch, keeping it in flight for `delay`.
    #[must_use]
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.options.fetch_delay = Some(delay);
        self
    }

    /// Only accept logins presenting exactly these credentials.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.options.credentials = Some(credentials);
        self
    }

    /// Create or replace a record, notifying its listeners.
    pub fn insert(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut records = lock(&self.shared.records);
        if let Some(record) = records.get(&name).cloned() {
            drop(records);
            record.replace(value);
            return;
        }
        records.insert(name.clone(), Arc::new(MemoryRecord::new(name, value)));
    }

    /// Write as an outside client would, creating the record when needed.
    pub fn write(&self, name: &str, sub_path: Option<&str>, value: Value) -> Result<()> {
        self.record(name).write(sub_path, value)
    }

    /// A copy of a record's document, if the record exists.
    pub fn value(&self, name: &str) -> Option<Value> {
        lock(&self.shared.records).get(name).map(|r| r.value())
    }

    /// Whether a record named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        lock(&self.shared.records).contains_key(name)
    }

    /// Names of all records, in order.
    pub fn record_names(&self) -> Vec<String> {
        lock(&self.shared.records).keys().cloned().collect()
    }

    /// Number of `fetch_record` calls issued for `name`.
    pub fn fetch_count(&self, name: &str) -> usize {
        lock(&self.shared.fetches).get(name).copied().unwrap_or(0)
    }

    /// Number of listeners registered on `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        lock(&self.shared.records)
            .get(name)
            .map(|r| r.listener_count())
            .unwrap_or(0)
    }

    /// Make the next fetch of `name` fail with `error`.
    pub fn fail_next_fetch(&self, name: impl Into<String>, error: Error) {
        lock(&self.shared.failures).insert(name.into(), error);
    }

    fn record(&self, name: &str) -> Arc<MemoryRecord> {
        lock(&self.shared.records)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryRecord::new(name, Value::Object(Map::new()))))
            .clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_record(&self, name: &str) -> Result<RecordHandle> {
        *lock(&self.shared.fetches).entry(name.to_string()).or_default() += 1;
        debug!(record = name, "fetching record");

        if let Some(delay) = self.options.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        let failure = lock(&self.shared.failures).remove(name);
        if let Some(error) = failure {
            warn!(record = name, error = %error, "injected fetch failure");
            return Err(error);
        }

        let record: RecordHandle = self.record(name);
        Ok(record)
    }

    async fn snapshot(&self, name: &str) -> Result<Value> {
        self.value(name).ok_or_else(|| Error::not_found(name))
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.contains(name))
    }
}

#[async_trait]
impl RpcTransport for MemoryStore {
    async fn provide(&self, name: &str, responder: RpcResponder) -> Result<()> {
        let previous = lock(&self.shared.providers).insert(name.to_string(), responder);
        if previous.is_some() {
            warn!(endpoint = name, "replacing existing rpc provider");
        } else {
            debug!(endpoint = name, "providing rpc endpoint");
        }
        Ok(())
    }

    async fn unprovide(&self, name: &str) -> Result<bool> {
        Ok(lock(&self.shared.providers).remove(name).is_some())
    }

    async fn make(&self, name: &str, args: Value) -> Result<Value> {
        let responder = lock(&self.shared.providers).get(name).cloned();
        let Some(responder) = responder else {
            return Err(Error::rpc(name, NO_RPC_PROVIDER));
        };

        responder(args)
            .await
            .map_err(|message| Error::rpc(name, message))
    }
}

#[async_trait]
impl Connector for MemoryStore {
    async fn connect(
        &self,
        endpoint: &Url,
        credentials: &Credentials,
    ) -> Result<Arc<dyn Connection>> {
        if let Some(required) = &self.options.credentials {
            if required != credentials {
                warn!(endpoint = %endpoint, "login rejected");
                return Err(Error::Auth {
                    message: "invalid credentials".to_string(),
                });
            }
        }

        debug!(endpoint = %endpoint, "connected to in-memory store");
        let connection: Arc<dyn Connection> = Arc::new(self.clone());
        Ok(connection)
    }
}
