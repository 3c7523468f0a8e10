//! The connected client: path-addressed reads, writes and subscriptions.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use recordfs_core::value_utils::{is_present, shallow_merge};
use recordfs_core::{
    Callback, CanonicalPath, Connection, Connector, PathExpr, PathParser, RecordHandle, RecordStore,
    Result,
};

use crate::cache::RecordCache;
use crate::config::ClientConfig;
use crate::rpc::Rpc;
use crate::subscription::{SubscribeOptions, SubscriptionManager};

/// A logged-in client.
///
/// Every operation takes a path expression (`"users/alice@name"`,
/// `["users", "alice"]`, or a [`PathExpr`]) and resolves it once with the
/// configured [`PathParser`]. Records are fetched through one shared
/// [`RecordCache`]; clones of a client share that cache and its
/// subscriptions.
///
/// # Example
///
/// ```rust
/// use recordfs_client::{Client, ClientConfig};
/// use recordfs_memory::MemoryStore;
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let client = Client::connect(ClientConfig::default(), &MemoryStore::new()).await?;
///
/// client.set("users/alice@name", json!("Alice")).await?;
/// assert_eq!(client.get("users/alice@name").await?, Some(json!("Alice")));
/// assert!(client.has("users/alice").await?);
/// # Ok::<(), recordfs_core::Error>(())
/// # }).unwrap();
/// ```
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    parser: PathParser,
    connection: Arc<dyn Connection>,
    cache: RecordCache,
    subscriptions: SubscriptionManager,
    rpc: Rpc,
}

impl Client {
    /// Connect and log in with `connector`, then build the client.
    pub async fn connect(config: ClientConfig, connector: &dyn Connector) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let connection = connector.connect(&endpoint, &config.credentials).await?;
        info!(endpoint = %endpoint, "connected");
        Ok(Self::with_connection(config, connection))
    }

    /// Build a client over a connection that is already logged in.
    pub fn with_connection(config: ClientConfig, connection: Arc<dyn Connection>) -> Self {
        let cache = RecordCache::new(connection.clone());
        Self {
            parser: config.parser(),
            subscriptions: SubscriptionManager::new(cache.clone()),
            rpc: Rpc::new(connection.clone()),
            config,
            connection,
            cache,
        }
    }

    /// The configuration the client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The record cache shared by every clone of this client.
    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    /// RPC over the same connection.
    pub fn rpc(&self) -> &Rpc {
        &self.rpc
    }

    /// Resolve a path expression into record name and sub-path.
    pub fn parse(&self, path: impl Into<PathExpr>) -> Result<CanonicalPath> {
        self.parser.parse(&path.into(), false)
    }

    /// The cached handle for the record addressed by `path`, fetching it
    /// on first use. Any sub-path is ignored.
    pub async fn get_record(&self, path: impl Into<PathExpr>) -> Result<RecordHandle> {
        let path = self.parser.parse(&path.into(), true)?;
        self.cache.get_record(&path.record_name).await
    }

    /// Read the value at `path`.
    ///
    /// A whole-record read of a record that is not cached is a one-shot
    /// snapshot and fails with `RecordNotFound` if the record does not exist.
    pub async fn get(&self, path: impl Into<PathExpr>) -> Result<Option<Value>> {
        let path = self.parse(path)?;
        self.read(&path).await
    }

    /// Read the value at `path`, or `fallback` when nothing is there.
    pub async fn get_or(&self, path: impl Into<PathExpr>, fallback: Value) -> Result<Value> {
        let path = self.parse(path)?;
        match self.read(&path).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Ok(fallback),
            Err(e) if e.is_not_found() => Ok(fallback),
            Err(e) => Err(e),
        }
    }

    /// Read and deserialize the value at `path`.
    pub async fn get_as<T: DeserializeOwned>(&self, path: impl Into<PathExpr>) -> Result<Option<T>> {
        match self.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Whether a meaningful value exists at `path`.
    ///
    /// `null`, `false`, `0`, `""`, `[]` and `{}` all count as absent, as
    /// does a missing record.
    pub async fn has(&self, path: impl Into<PathExpr>) -> Result<bool> {
        let path = self.parse(path)?;

        if path.sub_path().is_none()
            && !self.cache.contains(&path.record_name)
            && !self.connection.exists(&path.record_name).await?
        {
            return Ok(false);
        }

        match self.read(&path).await {
            Ok(value) => Ok(value.as_ref().is_some_and(is_present)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write `value` at `path`, or replace the whole record when `path` has
    /// no sub-path. Resolves with the written value once acknowledged.
    pub async fn set(&self, path: impl Into<PathExpr>, value: Value) -> Result<Value> {
        let path = self.parse(path)?;
        self.write(&path, value).await
    }

    /// Serialize `value` and write it at `path`.
    pub async fn set_as<T: Serialize>(&self, path: impl Into<PathExpr>, value: &T) -> Result<Value> {
        let value = serde_json::to_value(value)?;
        self.set(path, value).await
    }

    /// Shallow-merge `partial` into the object at `path` and write it back.
    ///
    /// A missing or non-object current value is treated as `{}`. The read
    /// and the write are separate store operations.
    pub async fn merge(&self, path: impl Into<PathExpr>, partial: Map<String, Value>) -> Result<Value> {
        let path = self.parse(path)?;
        let current = match self.read(&path).await {
            Ok(value) => value,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        self.write(&path, shallow_merge(current, partial)).await
    }

    /// Subscribe with the configured default for immediate replay.
    pub async fn subscribe(&self, path: impl Into<PathExpr>, callback: Callback) -> Result<()> {
        let options = SubscribeOptions {
            immediate: self.config.immediate,
        };
        self.subscribe_with(path, callback, options).await
    }

    /// Subscribe `callback` to changes at `path` with explicit options.
    pub async fn subscribe_with(
        &self,
        path: impl Into<PathExpr>,
        callback: Callback,
        options: SubscribeOptions,
    ) -> Result<()> {
        let path = self.parse(path)?;
        self.subscriptions.subscribe(&path, callback, options).await
    }

    /// Remove `callback` from `path`. Returns `false` if it was not
    /// subscribed there.
    pub fn unsubscribe(&self, path: impl Into<PathExpr>, callback: &Callback) -> Result<bool> {
        let path = self.parse(path)?;
        Ok(self.subscriptions.unsubscribe(&path, callback))
    }

    /// Number of live subscriptions made through this client and its clones.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.count()
    }

    async fn read(&self, path: &CanonicalPath) -> Result<Option<Value>> {
        if path.sub_path().is_some() {
            let handle = self.cache.get_record(&path.record_name).await?;
            return Ok(handle.get(path.sub_path()));
        }

        if let Some(handle) = self.cache.cached(&path.record_name) {
            return Ok(handle.get(None));
        }
        self.connection.snapshot(&path.record_name).await.map(Some)
    }

    async fn write(&self, path: &CanonicalPath, value: Value) -> Result<Value> {
        let handle = self.cache.get_record(&path.record_name).await?;
        handle.set(path.sub_path(), value.clone()).await?;
        debug!(path = %path, "value written");
        Ok(value)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("subscriptions", &self.subscriptions.count())
            .finish_non_exhaustive()
    }
}
