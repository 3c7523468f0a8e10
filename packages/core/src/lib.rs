//! recordfs core: the shared vocabulary of the record layer.
//!
//! - `PathExpr` / `CanonicalPath`: the path grammar and its normal form
//! - `Error`: every failure the layer can report
//! - `RemoteRecord`, `RecordStore`, `RpcTransport`, `Connector`: what the
//!   layer needs from a remote pub/sub record store
//! - `Callback`: change listeners that can be removed by identity
//!
//! # Example
//!
//! ```rust
//! use recordfs_core::{PathExpr, PathParser, SplitPolicy};
//!
//! let parser = PathParser::new(SplitPolicy::Slash);
//! let canonical = parser.parse(&PathExpr::text("users/alice@email"), false).unwrap();
//! assert_eq!(canonical.record_name, "users.alice");
//! assert_eq!(canonical.sub_path(), Some("email"));
//! ```

mod callback;
mod error;
mod path;
pub mod sync;
mod traits;
pub mod value_utils;

pub use callback::Callback;
pub use error::{Error, Result};
pub use path::{escape_segment, CanonicalPath, PathExpr, PathParser, SplitPolicy};
pub use traits::{
    Connection, Connector, Credentials, RecordHandle, RecordStore, RemoteRecord, RpcResponder,
    RpcTransport,
};

// Re-export the document and endpoint types used in the store traits
pub use serde_json::{Map, Value};
pub use url::Url;
