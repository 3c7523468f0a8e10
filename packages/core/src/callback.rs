//! Change callbacks with identity.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

type Listener = dyn Fn(&Value) + Send + Sync;

/// A change listener registered against a record.
///
/// Clones share identity: two `Callback`s are equal only when they came from
/// the same [`Callback::new`] call. This is what lets an unsubscribe remove
/// exactly the registration it names.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<Listener>,
}

impl Callback {
    /// Wrap `f` as a new listener with its own identity.
    pub fn new(f: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the listener with `value`.
    pub fn call(&self, value: &Value) {
        (self.inner)(value)
    }

    /// True when both handles refer to the same registered listener.
    pub fn same_as(&self, other: &Callback) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("listener", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn call_forwards_value() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback = Callback::new(move |v| sink.lock().unwrap().push(v.clone()));

        callback.call(&json!(1));
        callback.call(&json!("two"));

        assert_eq!(*seen.lock().unwrap(), vec![json!(1), json!("two")]);
    }

    #[test]
    fn clones_share_identity() {
        let a = Callback::new(|_| {});
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_closures_are_distinct() {
        let a = Callback::new(|_| {});
        let b = Callback::new(|_| {});
        assert_ne!(a, b);
    }
}
