use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::message::{Message, MessageId, Payload};
use super::topic::Topic;
use crate::store::Store;
use crate::utils::{QueueError, Result};

/// Appends new messages to a topic's backlog.
#[derive(Clone)]
pub struct Producer {
    store: Arc<dyn Store>,
}

impl Producer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Store the payload, then append its id to the backlog.
    ///
    /// The payload is written first so a consumer can never dequeue an id
    /// whose payload does not exist yet. If the payload write fails nothing
    /// is appended; if the append fails the payload entry is removed again.
    pub async fn publish(&self, topic: &Topic, payload: Payload) -> Result<MessageId> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            payload,
            created_at: Utc::now().timestamp_millis(),
        };
        let encoded = message.encode()?;
        let payloads = topic.payloads_key();

        if let Err(e) = self.store.hash_set(&payloads, &message.id, &encoded).await {
            return Err(QueueError::Publish {
                topic: topic.name().to_string(),
                reason: e.to_string(),
            });
        }

        if let Err(e) = self.store.append(&topic.backlog_key(), &message.id).await {
            if let Err(cleanup) = self.store.hash_del(&payloads, &message.id).await {
                warn!(
                    topic = topic.name(),
                    id = %message.id,
                    "failed to remove payload of unpublished message: {cleanup}"
                );
            }
            return Err(e);
        }

        debug!(topic = topic.name(), id = %message.id, "published");
        Ok(message.id)
    }
}
