use crate::store::{MemoryStore, Store};
use crate::transport::message::{StoreRequest, StoreResponse};
use crate::transport::websocket::handle_request;
use serde_json::json;

#[tokio::test]
async fn test_handle_append_and_list() {
    let store = MemoryStore::new();

    let response = handle_request(
        &store,
        StoreRequest::Append {
            list: "jobs:backlog".to_string(),
            value: "m1".to_string(),
        },
    )
    .await;
    assert_eq!(response, StoreResponse::Ok);

    let response = handle_request(
        &store,
        StoreRequest::ListContents {
            list: "jobs:backlog".to_string(),
        },
    )
    .await;
    assert_eq!(
        response,
        StoreResponse::Items {
            items: vec!["m1".to_string()]
        }
    );
}

#[tokio::test]
async fn test_handle_move_atomic() {
    let store = MemoryStore::new();
    store.append("src", "m1").await.unwrap();

    let request = StoreRequest::MoveAtomic {
        src: "src".to_string(),
        dst: "dst".to_string(),
    };
    assert_eq!(
        handle_request(&store, request.clone()).await,
        StoreResponse::Moved {
            value: Some("m1".to_string())
        }
    );
    assert_eq!(
        handle_request(&store, request).await,
        StoreResponse::Moved { value: None }
    );
    assert_eq!(store.list_contents("dst").await.unwrap(), vec!["m1"]);
}

#[tokio::test]
async fn test_handle_hash_roundtrip() {
    let store = MemoryStore::new();

    let set = StoreRequest::HashSet {
        map: "jobs:payloads".to_string(),
        field: "m1".to_string(),
        value: b"body".to_vec(),
    };
    assert_eq!(handle_request(&store, set).await, StoreResponse::Ok);

    let get = StoreRequest::HashGet {
        map: "jobs:payloads".to_string(),
        field: "m1".to_string(),
    };
    assert_eq!(
        handle_request(&store, get.clone()).await,
        StoreResponse::Value {
            value: Some(b"body".to_vec())
        }
    );

    let del = StoreRequest::HashDel {
        map: "jobs:payloads".to_string(),
        field: "m1".to_string(),
    };
    assert_eq!(
        handle_request(&store, del.clone()).await,
        StoreResponse::Removed { found: true }
    );
    assert_eq!(
        handle_request(&store, del).await,
        StoreResponse::Removed { found: false }
    );
    assert_eq!(
        handle_request(&store, get).await,
        StoreResponse::Value { value: None }
    );
}

#[tokio::test]
async fn test_handle_remove_and_keys() {
    let store = MemoryStore::new();
    store.append("a:backlog", "m1").await.unwrap();

    assert_eq!(
        handle_request(&store, StoreRequest::Keys).await,
        StoreResponse::Items {
            items: vec!["a:backlog".to_string()]
        }
    );

    let remove = StoreRequest::Remove {
        list: "a:backlog".to_string(),
        value: "m1".to_string(),
    };
    assert_eq!(
        handle_request(&store, remove).await,
        StoreResponse::Removed { found: true }
    );
    assert_eq!(
        handle_request(&store, StoreRequest::Keys).await,
        StoreResponse::Items { items: vec![] }
    );
}

#[test]
fn test_wire_format_is_tagged() {
    let request = StoreRequest::MoveAtomic {
        src: "t:backlog".to_string(),
        dst: "t:nextlog".to_string(),
    };
    assert_eq!(
        serde_json::to_value(&request).unwrap(),
        json!({"type": "move_atomic", "src": "t:backlog", "dst": "t:nextlog"})
    );

    let keys: StoreRequest = serde_json::from_value(json!({"type": "keys"})).unwrap();
    assert_eq!(keys, StoreRequest::Keys);

    let response: StoreResponse =
        serde_json::from_value(json!({"type": "error", "message": "boom"})).unwrap();
    assert_eq!(
        response,
        StoreResponse::Error {
            message: "boom".to_string()
        }
    );
}
