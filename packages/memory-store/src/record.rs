//! A single in-memory record with change listeners.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use recordfs_core::value_utils::{get_path, set_path};
use recordfs_core::sync::lock;
use recordfs_core::{Callback, RemoteRecord, Result};

struct Listener {
    sub_path: Option<String>,
    callback: Callback,
}

/// An in-memory record document.
///
/// Listeners fire only when the value at their sub-path actually changed,
/// and always after the record's locks have been released.
pub struct MemoryRecord {
    name: String,
    data: Mutex<Value>,
    listeners: Mutex<Vec<Listener>>,
}

impl MemoryRecord {
    pub(crate) fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            data: Mutex::new(value),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// A copy of the whole document.
    pub fn value(&self) -> Value {
        lock(&self.data).clone()
    }

    /// Number of registered listeners across all sub-paths.
    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Replace the whole document and notify affected listeners.
    pub fn replace(&self, value: Value) {
        let notifications = {
            let mut data = lock(&self.data);
            let before = self.watched_values(&data);
            *data = value;
            changed(before, &data)
        };
        self.notify(None, notifications);
    }

    /// Write synchronously and notify affected listeners.
    ///
    /// Fails without touching the document when `sub_path` runs through a
    /// primitive value or past the end of an array.
    pub fn write(&self, sub_path: Option<&str>, value: Value) -> Result<()> {
        let Some(sub_path) = sub_path else {
            self.replace(value);
            return Ok(());
        };

        let notifications = {
            let mut data = lock(&self.data);
            let before = self.watched_values(&data);
            set_path(&mut data, Some(sub_path), value)?;
            changed(before, &data)
        };
        self.notify(Some(sub_path), notifications);
        Ok(())
    }

    /// Each listener paired with the value it currently watches.
    fn watched_values(&self, data: &Value) -> Vec<Watched> {
        lock(&self.listeners)
            .iter()
            .map(|l| Watched {
                callback: l.callback.clone(),
                old: get_path(data, l.sub_path.as_deref()).cloned(),
                sub_path: l.sub_path.clone(),
            })
            .collect()
    }

    fn notify(&self, sub_path: Option<&str>, notifications: Vec<(Callback, Value)>) {
        trace!(
            record = %self.name,
            sub_path = sub_path.unwrap_or(""),
            notified = notifications.len(),
            "record written"
        );

        for (callback, value) in notifications {
            callback.call(&value);
        }
    }
}

struct Watched {
    callback: Callback,
    sub_path: Option<String>,
    old: Option<Value>,
}

/// Listeners whose watched value differs in `data`, with the new value.
fn changed(before: Vec<Watched>, data: &Value) -> Vec<(Callback, Value)> {
    before
        .into_iter()
        .filter_map(|w| {
            let new = get_path(data, w.sub_path.as_deref()).cloned();
            (new != w.old).then(|| (w.callback, new.unwrap_or(Value::Null)))
        })
        .collect()
}

#[async_trait]
impl RemoteRecord for MemoryRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, sub_path: Option<&str>) -> Option<Value> {
        get_path(&lock(&self.data), sub_path).cloned()
    }

    async fn set(&self, sub_path: Option<&str>, value: Value) -> Result<()> {
        self.write(sub_path, value)
    }

    fn subscribe(&self, sub_path: Option<&str>, callback: Callback) {
        lock(&self.listeners).push(Listener {
            sub_path: sub_path.map(str::to_string),
            callback,
        });
    }

    fn unsubscribe(&self, sub_path: Option<&str>, callback: &Callback) -> bool {
        let mut listeners = lock(&self.listeners);
        let position = listeners
            .iter()
            .position(|l| l.sub_path.as_deref() == sub_path && l.callback.same_as(callback));
        match position {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }
}
