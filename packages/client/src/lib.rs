//! Path-addressed access to a remote record store.
//!
//! A [`Client`] sits between application code and a pub/sub record store.
//! It resolves path expressions into record names and sub-paths, keeps one
//! shared handle per record, and layers reads, writes, change subscriptions
//! and RPC on top of the store contract from `recordfs-core`.
//!
//! ```text
//! application ─► Client ─► PathParser ─► RecordCache ─► RemoteRecord
//!                   │                                      │
//!                   └── SubscriptionManager ◄── changes ───┘
//! ```

mod cache;
mod client;
mod config;
mod rpc;
mod subscription;

pub use cache::RecordCache;
pub use client::Client;
pub use config::{ClientConfig, DEFAULT_PATH, DEFAULT_PORT};
pub use rpc::Rpc;
pub use subscription::{SubscribeOptions, SubscriptionManager};
