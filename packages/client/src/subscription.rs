//! Change subscriptions layered over the record cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::debug;

use recordfs_core::{Callback, CanonicalPath, Result};
use recordfs_core::sync::lock;

use crate::cache::RecordCache;

/// Options for a single subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Invoke the callback once with the current value before any change.
    pub immediate: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self { immediate: true }
    }
}

impl SubscribeOptions {
    /// Only deliver changes; skip the replay of the current value.
    pub fn updates_only() -> Self {
        Self { immediate: false }
    }
}

/// Registers change callbacks on cached record handles.
///
/// Keeps its own registry of live subscriptions so an unsubscribe for a
/// record that was never subscribed resolves without touching the store.
/// Removing the last callback of a record leaves the record cached and open.
#[derive(Clone)]
pub struct SubscriptionManager {
    cache: RecordCache,
    registry: Arc<Mutex<HashMap<CanonicalPath, Vec<Callback>>>>,
}

impl SubscriptionManager {
    /// Create a manager registering callbacks on handles from `cache`.
    pub fn new(cache: RecordCache) -> Self {
        Self {
            cache,
            registry: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe `callback` to changes at `path`.
    ///
    /// With `options.immediate`, the callback first receives the current
    /// value (`null` when nothing is stored) exactly once, before it is
    /// registered for changes.
    pub async fn subscribe(
        &self,
        path: &CanonicalPath,
        callback: Callback,
        options: SubscribeOptions,
    ) -> Result<()> {
        let handle = self.cache.get_record(&path.record_name).await?;
        let sub_path = path.sub_path();

        if options.immediate {
            let current = handle.get(sub_path).unwrap_or(Value::Null);
            callback.call(&current);
        }

        handle.subscribe(sub_path, callback.clone());
        lock(&self.registry)
            .entry(path.clone())
            .or_default()
            .push(callback);

        debug!(path = %path, immediate = options.immediate, "subscribed");
        Ok(())
    }

    /// Remove one registration of `callback` at `path`.
    ///
    /// Returns `false`, without error, when no such registration exists.
    pub fn unsubscribe(&self, path: &CanonicalPath, callback: &Callback) -> bool {
        let removed = {
            let mut registry = lock(&self.registry);
            let Some(callbacks) = registry.get_mut(path) else {
                return false;
            };
            let Some(index) = callbacks.iter().position(|c| c.same_as(callback)) else {
                return false;
            };
            callbacks.remove(index);
            if callbacks.is_empty() {
                registry.remove(path);
            }
            true
        };

        if let Some(handle) = self.cache.cached(&path.record_name) {
            handle.unsubscribe(path.sub_path(), callback);
        }

        debug!(path = %path, "unsubscribed");
        removed
    }

    /// Number of live registrations across all paths.
    pub fn count(&self) -> usize {
        lock(&self.registry).values().map(Vec::len).sum()
    }

    /// Number of live registrations at `path`.
    pub fn count_at(&self, path: &CanonicalPath) -> usize {
        lock(&self.registry).get(path).map(Vec::len).unwrap_or(0)
    }
}
