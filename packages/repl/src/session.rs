//! Shell session state: the backing store, a connected client, and the
//! subscriptions opened from the prompt.

use std::collections::{BTreeMap, VecDeque};
use std::future::{ready, Future};
use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use recordfs_client::{Client, ClientConfig};
use recordfs_core::sync::lock;
use recordfs_core::{Callback, CanonicalPath, PathExpr, SplitPolicy};
use recordfs_memory::MemoryStore;

/// Errors raised while driving the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] recordfs_core::Error),

    #[error("already subscribed to {0}")]
    AlreadySubscribed(String),
}

/// A value delivered to a shell subscription.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub path: String,
    pub value: Value,
}

type Queue = Arc<Mutex<VecDeque<Notification>>>;

/// Everything a shell command operates on.
///
/// Commands run synchronously; the session drives the async client on its
/// own current-thread runtime.
pub struct Session {
    runtime: Runtime,
    store: MemoryStore,
    client: Client,
    subscriptions: BTreeMap<CanonicalPath, Callback>,
    notifications: Queue,
}

impl Session {
    /// Start a runtime, connect a client to a fresh in-memory store and serve the built-in endpoints.
    pub fn new(split: SplitPolicy) -> Result<Self, SessionError> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        let store = MemoryStore::new();
        let config = ClientConfig::default().with_split(split);
        let client = runtime.block_on(Client::connect(config, &store))?;

        let session = Self {
            runtime,
            store,
            client,
            subscriptions: BTreeMap::new(),
            notifications: Arc::new(Mutex::new(VecDeque::new())),
        };
        session.provide_builtins()?;
        Ok(session)
    }

    /// The connected client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The backing store, for listings and inspection.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Run a client future to completion.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Subscribe the shell to `expr`; changes queue up as notifications.
    pub fn subscribe(&mut self, expr: &PathExpr) -> Result<CanonicalPath, SessionError> {
        let path = self.client.parse(expr)?;
        if self.subscriptions.contains_key(&path) {
            return Err(SessionError::AlreadySubscribed(path.to_string()));
        }

        let queue = self.notifications.clone();
        let label = path.to_string();
        let callback = Callback::new(move |value| {
            lock(&queue).push_back(Notification {
                path: label.clone(),
                value: value.clone(),
            });
        });

        self.runtime
            .block_on(self.client.subscribe(expr, callback.clone()))?;
        self.subscriptions.insert(path.clone(), callback);
        debug!(path = %path, "shell subscribed");
        Ok(path)
    }

    /// Drop the shell's subscription at `expr`. Returns `false` if there was
    /// none.
    pub fn unsubscribe(&mut self, expr: &PathExpr) -> Result<(CanonicalPath, bool), SessionError> {
        let path = self.client.parse(expr)?;
        let Some(callback) = self.subscriptions.remove(&path) else {
            return Ok((path, false));
        };
        let removed = self.client.unsubscribe(expr, &callback)?;
        Ok((path, removed))
    }

    /// Canonical paths the shell is subscribed to, in order.
    pub fn subscription_paths(&self) -> Vec<String> {
        self.subscriptions.keys().map(ToString::to_string).collect()
    }

    /// Number of shell subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Take every notification queued since the last call, oldest first.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        lock(&self.notifications).drain(..).collect()
    }

    /// Endpoints the shell serves itself, so `call` has something to reach.
    fn provide_builtins(&self) -> Result<(), SessionError> {
        let rpc = self.client.rpc();
        self.block_on(rpc.provide("echo", |args: Value| ready(Ok::<_, String>(args))))?;

        let store = self.store.clone();
        self.block_on(rpc.provide("records.list", move |_: Value| {
            ready(Ok::<_, String>(json!(store.record_names())))
        }))?;
        Ok(())
    }
}
