//! The contract recordfs consumes from a remote pub/sub record store.
//!
//! The store itself (wire protocol, server, login handshake) lives elsewhere;
//! these traits describe only what the cache and subscription layer needs
//! from it. All traits are object-safe and used as `Arc<dyn ...>`.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::callback::Callback;
use crate::error::Result;

/// A shared handle to one remote record.
pub type RecordHandle = Arc<dyn RemoteRecord>;

/// The transport-level side of an RPC endpoint.
///
/// Receives the request payload and resolves with either the response value
/// or an error string to send back to the caller.
pub type RpcResponder =
    Arc<dyn Fn(Value) -> BoxFuture<'static, std::result::Result<Value, String>> + Send + Sync>;

/// Login parameters handed to the store on connect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(Map<String, Value>);

impl Credentials {
    /// Empty credentials, for stores that accept anonymous logins.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one login parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Look up a login parameter.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// True when no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A record whose initial state has been loaded.
#[async_trait]
pub trait RemoteRecord: Send + Sync {
    /// The record's canonical name.
    fn name(&self) -> &str;

    /// Read the current value, whole or at a sub-path.
    ///
    /// Returns `None` when nothing is stored there.
    fn get(&self, sub_path: Option<&str>) -> Option<Value>;

    /// Write a value at a sub-path, or replace the whole record for `None`.
    ///
    /// Resolves once the store has acknowledged the write.
    async fn set(&self, sub_path: Option<&str>, value: Value) -> Result<()>;

    /// Register `callback` for changes at `sub_path` (the whole record for
    /// `None`).
    fn subscribe(&self, sub_path: Option<&str>, callback: Callback);

    /// Remove one registration of `callback` at `sub_path`.
    ///
    /// Returns whether a registration was removed.
    fn unsubscribe(&self, sub_path: Option<&str>, callback: &Callback) -> bool;
}

/// Record-level operations of a connected store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record and wait until its initial state is loaded.
    async fn fetch_record(&self, name: &str) -> Result<RecordHandle>;

    /// One-shot read of a record without keeping a handle.
    ///
    /// Fails with [`Error::RecordNotFound`](crate::Error::RecordNotFound) when
    /// the record does not exist.
    async fn snapshot(&self, name: &str) -> Result<Value>;

    /// Whether a record with this name exists.
    async fn exists(&self, name: &str) -> Result<bool>;
}

/// Request/response routing of a connected store.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Register the implementation of endpoint `name`.
    async fn provide(&self, name: &str, responder: RpcResponder) -> Result<()>;

    /// Stop providing endpoint `name`. Returns whether it was provided.
    async fn unprovide(&self, name: &str) -> Result<bool>;

    /// Call endpoint `name` and wait for its response.
    async fn make(&self, name: &str, args: Value) -> Result<Value>;
}

/// A logged-in store connection: records plus RPC.
///
/// Automatically implemented for any type that implements both
/// `RecordStore` and `RpcTransport`.
pub trait Connection: RecordStore + RpcTransport {}
impl<T: RecordStore + RpcTransport + ?Sized> Connection for T {}

/// Opens store connections.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `endpoint` and log in.
    ///
    /// Must complete before any other operation is issued on the connection.
    async fn connect(&self, endpoint: &Url, credentials: &Credentials)
        -> Result<Arc<dyn Connection>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn credentials_builder() {
        let creds = Credentials::new()
            .with("username", "alice")
            .with("token", 42);
        assert_eq!(creds.get("username"), Some(&json!("alice")));
        assert_eq!(creds.get("token"), Some(&json!(42)));
        assert!(!creds.is_empty());
    }

    #[test]
    fn credentials_serialize_as_plain_object() {
        let creds = Credentials::new().with("username", "alice");
        assert_eq!(serde_json::to_value(&creds).unwrap(), json!({"username": "alice"}));

        let parsed: Credentials = serde_json::from_value(json!({"password": "pw"})).unwrap();
        assert_eq!(parsed.get("password"), Some(&json!("pw")));
    }
}
