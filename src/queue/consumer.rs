//! Consumer side of a topic.
//!
//! A message moves `backlog -> nextlog` when consumed and leaves nextlog
//! either through [`Consumer::commit`] or through a harvest that returns it
//! to the backlog. While in nextlog it is visible to exactly one consumer.
//! A crash between consume and commit leads to redelivery after a harvest,
//! so handlers must tolerate duplicates.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error};

use super::message::{Message, MessageId};
use super::topic::Topic;
use crate::config::ConsumerSettings;
use crate::store::Store;
use crate::utils::{QueueError, Result};

/// How [`Consumer::consume`] behaves on an empty backlog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeOptions {
    /// Keep polling until a message arrives or `timeout` elapses.
    pub block: bool,
    /// Upper bound on the wait. `None` waits forever, zero tries once.
    pub timeout: Option<Duration>,
}

impl Default for ConsumeOptions {
    fn default() -> Self {
        Self {
            block: true,
            timeout: None,
        }
    }
}

impl ConsumeOptions {
    /// Try once and return immediately.
    pub fn no_wait() -> Self {
        Self {
            block: false,
            timeout: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            block: true,
            timeout: Some(timeout),
        }
    }
}

/// Poll interval bounds for blocking consumes. The interval doubles after
/// every empty poll up to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(25),
            max: Duration::from_secs(1),
        }
    }
}

impl From<&ConsumerSettings> for Backoff {
    fn from(settings: &ConsumerSettings) -> Self {
        let initial = Duration::from_millis(settings.poll_interval_ms.max(1));
        let max = Duration::from_millis(settings.max_poll_interval_ms).max(initial);
        Self { initial, max }
    }
}

#[derive(Clone)]
pub struct Consumer {
    store: Arc<dyn Store>,
    backoff: Backoff,
}

impl Consumer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Take the head of the backlog and return its message.
    ///
    /// Returns `Ok(None)` when the backlog stays empty for the whole wait.
    /// Once the atomic move has happened the message counts as delivered:
    /// dropping the returned value does not put it back, only `commit` or a
    /// harvest resolves it.
    pub async fn consume(&self, topic: &Topic, options: ConsumeOptions) -> Result<Option<Message>> {
        let backlog = topic.backlog_key();
        let nextlog = topic.nextlog_key();
        // a timeout too large to represent waits forever
        let deadline = options
            .timeout
            .and_then(|t| Instant::now().checked_add(t));
        let mut delay = self.backoff.initial;

        loop {
            if let Some(id) = self.store.move_atomic(&backlog, &nextlog).await? {
                return self.load(topic, id).await.map(Some);
            }
            if !options.block {
                return Ok(None);
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    delay.min(deadline - now)
                }
                None => delay,
            };
            sleep(wait).await;
            delay = delay.saturating_mul(2).min(self.backoff.max);
        }
    }

    async fn load(&self, topic: &Topic, id: MessageId) -> Result<Message> {
        let Some(raw) = self.store.hash_get(&topic.payloads_key(), &id).await? else {
            error!(topic = topic.name(), %id, "dequeued message has no payload; left in nextlog");
            return Err(QueueError::PayloadMissing {
                topic: topic.name().to_string(),
                id,
            });
        };
        let message = Message::decode(&raw)?;
        debug!(topic = topic.name(), %id, "consumed");
        Ok(message)
    }

    /// Acknowledge a consumed message: drop it from nextlog and delete its
    /// payload. Returns `false` if the id was not in nextlog (already
    /// committed, harvested or purged); that case changes nothing.
    pub async fn commit(&self, topic: &Topic, id: &str) -> Result<bool> {
        if !self.store.remove(&topic.nextlog_key(), id).await? {
            debug!(topic = topic.name(), id, "commit of message not in nextlog");
            return Ok(false);
        }
        self.store.hash_del(&topic.payloads_key(), id).await?;
        debug!(topic = topic.name(), id, "committed");
        Ok(true)
    }
}
