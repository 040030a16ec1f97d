//! Wire messages exchanged between a [`RemoteStore`](crate::store::RemoteStore)
//! and the store server. Each request gets exactly one response, sent as a
//! JSON text frame tagged by `"type"`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreRequest {
    Append { list: String, value: String },
    MoveAtomic { src: String, dst: String },
    Remove { list: String, value: String },
    HashSet { map: String, field: String, value: Vec<u8> },
    HashGet { map: String, field: String },
    HashDel { map: String, field: String },
    ListContents { list: String },
    Keys,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreResponse {
    Ok,
    Moved { value: Option<String> },
    Removed { found: bool },
    Value { value: Option<Vec<u8>> },
    Items { items: Vec<String> },
    Error { message: String },
}
