//! recordfs: path-addressed access to a remote pub/sub record store.
//!
//! Records are JSON documents named by dotted paths. A [`Client`] resolves
//! path expressions such as `"users/alice@profile.name"` into a record name
//! and a sub-path, keeps one shared handle per record, and layers reads,
//! writes, change subscriptions and RPC on top of the store.
//!
//! ## Crates
//!
//! - `recordfs-core` - path grammar, errors, and the store contract traits
//! - `recordfs-client` - record cache, access facade, subscriptions, RPC
//! - `recordfs-memory` - an in-memory store (feature `memory`, on by default)
//!
//! ## Quick start
//!
//! ```rust
//! use recordfs::prelude::*;
//! use recordfs::MemoryStore;
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
//! let store = MemoryStore::new();
//! let client = Client::connect(ClientConfig::default(), &store).await?;
//!
//! let on_change = Callback::new(|value| println!("score is now {value}"));
//! client.subscribe("game/score@home", on_change.clone()).await?;
//!
//! client.set("game/score@home", json!(1)).await?;
//! client.unsubscribe("game/score@home", &on_change)?;
//! # Ok::<(), recordfs::Error>(())
//! # }).unwrap();
//! ```

pub use recordfs_client::{
    Client, ClientConfig, RecordCache, Rpc, SubscribeOptions, SubscriptionManager, DEFAULT_PATH,
    DEFAULT_PORT,
};
pub use recordfs_core::{
    escape_segment, value_utils, Callback, CanonicalPath, Connection, Connector, Credentials,
    Error, PathExpr, PathParser, RecordHandle, RecordStore, RemoteRecord, Result, RpcResponder,
    RpcTransport, SplitPolicy,
};

#[cfg(feature = "memory")]
pub use recordfs_memory::{MemoryRecord, MemoryStore, NO_RPC_PROVIDER};

/// The types most callers need.
pub mod prelude {
    pub use recordfs_client::{Client, ClientConfig, SubscribeOptions};
    pub use recordfs_core::{Callback, Error, PathExpr, Result, SplitPolicy};
}
