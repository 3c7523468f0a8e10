//! In-memory record store for recordfs.
//!
//! `MemoryStore` implements the full store contract (`Connector`,
//! `RecordStore`, `RpcTransport`) without a network. It backs the `recordfs`
//! shell and gives tests a store they can seed, inspect and make fail.

mod record;
mod store;

pub use record::MemoryRecord;
pub use store::{MemoryStore, NO_RPC_PROVIDER};
