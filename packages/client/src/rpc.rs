//! Request/response calls over the store connection.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use recordfs_core::{Connection, Result, RpcResponder, RpcTransport};

/// Provides and calls named RPC endpoints.
#[derive(Clone)]
pub struct Rpc {
    connection: Arc<dyn Connection>,
}

impl Rpc {
    /// Create an RPC facade over `connection`.
    pub fn new(connection: Arc<dyn Connection>) -> Self {
        Self { connection }
    }

    /// Serve endpoint `name` with `handler`.
    ///
    /// The handler's `Ok` value is serialized as the response. An `Err` is
    /// sent to the caller as its display string, and so is a panic inside
    /// the handler. A synchronous handler can return `std::future::ready(..)`.
    pub async fn provide<F, Fut, T, E>(&self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Serialize + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let handler = Arc::new(handler);
        let endpoint = name.to_string();

        let responder: RpcResponder = Arc::new(move |args: Value| {
            let handler = handler.clone();
            let endpoint = endpoint.clone();
            async move {
                let outcome = AssertUnwindSafe(async move { handler(args).await })
                    .catch_unwind()
                    .await;
                match outcome {
                    Ok(Ok(response)) => serde_json::to_value(response).map_err(|e| e.to_string()),
                    Ok(Err(error)) => Err(error.to_string()),
                    Err(panic) => {
                        let message = panic_message(panic.as_ref());
                        warn!(endpoint = %endpoint, panic = %message, "rpc handler panicked");
                        Err(message)
                    }
                }
            }
            .boxed()
        });

        self.connection.provide(name, responder).await?;
        debug!(endpoint = name, "rpc provided");
        Ok(())
    }

    /// Stop serving endpoint `name`. Returns whether it was being served.
    pub async fn unprovide(&self, name: &str) -> Result<bool> {
        self.connection.unprovide(name).await
    }

    /// Call endpoint `name` and return its raw response.
    pub async fn call(&self, name: &str, args: impl Serialize) -> Result<Value> {
        let args = serde_json::to_value(args)?;
        debug!(endpoint = name, "rpc call");
        self.connection.make(name, args).await
    }

    /// Call endpoint `name` and deserialize its response.
    pub async fn call_as<T: DeserializeOwned>(&self, name: &str, args: impl Serialize) -> Result<T> {
        let response = self.call(name, args).await?;
        Ok(serde_json::from_value(response)?)
    }
}

impl fmt::Debug for Rpc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rpc").finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "rpc handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordfs_core::Error;
    use recordfs_memory::{MemoryStore, NO_RPC_PROVIDER};
    use serde_json::json;
    use std::future::ready;

    fn rpc() -> Rpc {
        Rpc::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn async_handler_round_trip() {
        let rpc = rpc();
        rpc.provide("add", |args: Value| async move {
            let a = args["a"].as_i64().unwrap_or(0);
            let b = args["b"].as_i64().unwrap_or(0);
            Ok::<_, String>(a + b)
        })
        .await
        .unwrap();

        let sum: i64 = rpc.call_as("add", json!({"a": 2, "b": 3})).await.unwrap();
        assert_eq!(sum, 5);
    }

    #[tokio::test]
    async fn sync_handler_with_ready() {
        let rpc = rpc();
        rpc.provide("echo", |args: Value| ready(Ok::<_, String>(args)))
            .await
            .unwrap();

        assert_eq!(rpc.call("echo", "hi").await.unwrap(), json!("hi"));
    }

    #[tokio::test]
    async fn handler_error_becomes_rpc_error() {
        let rpc = rpc();
        rpc.provide("fails", |_: Value| ready(Err::<Value, _>("bad input")))
            .await
            .unwrap();

        assert_eq!(
            rpc.call("fails", Value::Null).await.unwrap_err(),
            Error::rpc("fails", "bad input")
        );
    }

    #[tokio::test]
    async fn handler_panic_becomes_rpc_error() {
        let rpc = rpc();
        rpc.provide("explodes", |_: Value| async move {
            if true {
                panic!("handler blew up");
            }
            Ok::<Value, String>(Value::Null)
        })
        .await
        .unwrap();

        assert_eq!(
            rpc.call("explodes", Value::Null).await.unwrap_err(),
            Error::rpc("explodes", "handler blew up")
        );
        // The endpoint keeps serving after a panic.
        assert!(rpc.call("explodes", Value::Null).await.is_err());
    }

    #[tokio::test]
    async fn missing_provider_and_unprovide() {
        let rpc = rpc();
        assert_eq!(
            rpc.call("nobody", Value::Null).await.unwrap_err(),
            Error::rpc("nobody", NO_RPC_PROVIDER)
        );

        rpc.provide("once", |_: Value| ready(Ok::<_, String>(1)))
            .await
            .unwrap();
        assert!(rpc.unprovide("once").await.unwrap());
        assert!(!rpc.unprovide("once").await.unwrap());
    }

    #[tokio::test]
    async fn call_as_reports_shape_mismatch() {
        let rpc = rpc();
        rpc.provide("text", |_: Value| ready(Ok::<_, String>("not a number")))
            .await
            .unwrap();

        let err = rpc.call_as::<u32>("text", Value::Null).await.unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn panic_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42_u8), "rpc handler panicked");
    }
}
