//! Record cache with single-flight fetches.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::runtime::Handle;
use tracing::{debug, trace, warn};

use recordfs_core::{Connection, RecordHandle, RecordStore, Result};
use recordfs_core::sync::lock;


type PendingFetch = Shared<BoxFuture<'static, Result<RecordHandle>>>;

enum Slot {
    Ready(RecordHandle),
    Pending(PendingFetch),
}

/// Maps record names to the one shared handle for each record.
///
/// A name is fetched at most once at a time: callers arriving while a fetch
/// is in flight wait on that same fetch. A fetch runs on its own task, so it
/// completes and fills the cache even if every caller stops waiting. Ready
/// handles stay cached for the lifetime of the cache. A failed fetch is
/// reported to every waiter and its slot cleared, so the next call starts a
/// fresh fetch.
///
/// Clones share the same slots.
#[derive(Clone)]
pub struct RecordCache {
    connection: Arc<dyn Connection>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl RecordCache {
    /// Create an empty cache fetching through `connection`.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self {
            connection,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Resolve the handle for `name`, fetching it if needed.
    pub async fn get_record(&self, name: &str) -> Result<RecordHandle> {
        let (fetch, started) = {
            let mut slots = lock(&self.slots);
            match slots.get(name) {
                Some(Slot::Ready(handle)) => return Ok(handle.clone()),
                Some(Slot::Pending(fetch)) => {
                    trace!(record = name, "joining in-flight fetch");
                    (fetch.clone(), false)
                }
                None => {
                    let fetch = self.start_fetch(name.to_string());
                    slots.insert(name.to_string(), Slot::Pending(fetch.clone()));
                    (fetch, true)
                }
            }
        };

        if started {
            drive(name, fetch.clone());
        }
        fetch.await
    }

    /// The handle for `name` if it is already cached. Never fetches.
    pub fn cached(&self, name: &str) -> Option<RecordHandle> {
        match lock(&self.slots).get(name) {
            Some(Slot::Ready(handle)) => Some(handle.clone()),
            _ => None,
        }
    }

    /// Whether a ready handle for `name` is cached.
    pub fn contains(&self, name: &str) -> bool {
        self.cached(name).is_some()
    }

    /// Number of cached handles, not counting fetches in flight.
    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// True when no handle is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of cached records, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.slots)
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Build the shared fetch for `name`. The slot is settled by the fetch
    /// itself, so it happens once no matter how many callers await it.
    fn start_fetch(&self, name: String) -> PendingFetch {
        let connection = self.connection.clone();
        let slots = self.slots.clone();

        async move {
            debug!(record = %name, "fetching record");
            let result = connection.fetch_record(&name).await;

            let mut slots = lock(&slots);
            match &result {
                Ok(handle) => {
                    slots.insert(name, Slot::Ready(handle.clone()));
                }
                Err(error) => {
                    warn!(record = %name, error = %error, "record fetch failed");
                    slots.remove(&name);
                }
            }
            result
        }
        .boxed()
        .shared()
    }
}

/// Poll `fetch` to completion on the current runtime, independent of the
/// callers awaiting it. Outside a runtime the callers drive it themselves.
fn drive(name: &str, fetch: PendingFetch) {
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(fetch);
        }
        Err(_) => trace!(record = name, "no runtime, fetch driven by its callers"),
    }
}

impl fmt::Debug for RecordCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCache")
            .field("records", &self.names())
            .finish()
    }
}
