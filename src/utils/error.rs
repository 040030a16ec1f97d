//! The `error` module defines the error type shared by every layer of `rfq`.
//!
//! Store backends, the queue components and the CLI all return
//! [`QueueError`]. Store-layer failures propagate unchanged; the only retry
//! in the library is the polling loop of a blocking consume.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store could not be reached or the connection broke.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The payload write failed, so the message id was never appended.
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },

    /// An id was dequeued but has no payload entry. The id stays in nextlog.
    #[error("payload missing for message {id} in topic '{topic}'")]
    PayloadMissing { topic: String, id: String },

    #[error("invalid topic name '{name}': {reason}")]
    InvalidTopicName { name: String, reason: &'static str },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The store server executed the request and reported a failure.
    #[error("store server error: {0}")]
    Remote(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;
