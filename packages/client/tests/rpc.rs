use std::future::ready;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use recordfs_client::{Client, ClientConfig};
use recordfs_core::Error;
use recordfs_memory::{MemoryStore, NO_RPC_PROVIDER};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Quote {
    symbol: String,
    price: f64,
}

async fn connect(store: &MemoryStore) -> Client {
    Client::connect(ClientConfig::default(), store).await.unwrap()
}

#[tokio::test]
async fn test_provider_and_caller_on_separate_clients() {
    let store = MemoryStore::new();
    let provider = connect(&store).await;
    let caller = connect(&store).await;

    provider
        .rpc()
        .provide("quote", |args: Value| async move {
            let Some(symbol) = args.as_str() else {
                return Err("symbol must be a string".to_string());
            };
            Ok(Quote {
                symbol: symbol.to_uppercase(),
                price: 10.5,
            })
        })
        .await
        .unwrap();

    let quote: Quote = caller.rpc().call_as("quote", "abc").await.unwrap();
    assert_eq!(
        quote,
        Quote {
            symbol: "ABC".to_string(),
            price: 10.5
        }
    );

    assert_eq!(
        caller.rpc().call("quote", 7).await.unwrap_err(),
        Error::rpc("quote", "symbol must be a string")
    );
}

#[tokio::test]
async fn test_handler_can_use_the_record_layer() {
    let store = MemoryStore::new();
    let client = connect(&store).await;

    let inner = client.clone();
    client
        .rpc()
        .provide("counter.increment", move |_: Value| {
            let client = inner.clone();
            async move {
                let current = client.get_or("counter@n", json!(0)).await?;
                let next = current.as_i64().unwrap_or(0) + 1;
                client.set("counter@n", json!(next)).await
            }
        })
        .await
        .unwrap();

    for expected in 1..=3 {
        assert_eq!(
            client.rpc().call("counter.increment", Value::Null).await.unwrap(),
            json!(expected)
        );
    }
    assert_eq!(store.value("counter"), Some(json!({"n": 3})));
}

#[tokio::test]
async fn test_panicking_handler_reports_error() {
    let store = MemoryStore::new();
    let client = connect(&store).await;

    client
        .rpc()
        .provide("divide", |args: Value| {
            let a = args["a"].as_i64().unwrap_or(0);
            let b = args["b"].as_i64().unwrap_or(0);
            // Integer division by zero panics.
            ready(Ok::<_, String>(a / b))
        })
        .await
        .unwrap_or_else(|e| panic!("provide failed: {e}"));

    assert_eq!(
        client
            .rpc()
            .call("divide", json!({"a": 6, "b": 3}))
            .await
            .unwrap(),
        json!(2)
    );

    let err = client
        .rpc()
        .call("divide", json!({"a": 1, "b": 0}))
        .await
        .unwrap_err();
    match err {
        Error::Rpc { name, message } => {
            assert_eq!(name, "divide");
            assert!(message.contains("divide by zero"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unprovided_endpoint() {
    let store = MemoryStore::new();
    let client = connect(&store).await;

    client
        .rpc()
        .provide("temp", |_: Value| ready(Ok::<_, String>(true)))
        .await
        .unwrap();
    assert!(client.rpc().unprovide("temp").await.unwrap());

    assert_eq!(
        client.rpc().call("temp", Value::Null).await.unwrap_err(),
        Error::rpc("temp", NO_RPC_PROVIDER)
    );
}
