use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::message::MessageId;
use super::topic::Topic;
use crate::store::Store;
use crate::utils::Result;

/// Which of a topic's two lists an admin operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueKind {
    #[default]
    Backlog,
    Nextlog,
}

impl QueueKind {
    pub fn key(self, topic: &Topic) -> String {
        match self {
            QueueKind::Backlog => topic.backlog_key(),
            QueueKind::Nextlog => topic.nextlog_key(),
        }
    }
}

impl FromStr for QueueKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "backlog" => Ok(QueueKind::Backlog),
            "nextlog" => Ok(QueueKind::Nextlog),
            other => Err(format!("unknown queue '{other}', expected backlog or nextlog")),
        }
    }
}

impl std::fmt::Display for QueueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueKind::Backlog => f.write_str("backlog"),
            QueueKind::Nextlog => f.write_str("nextlog"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicInfo {
    pub topic: String,
    pub backlog_depth: usize,
    pub nextlog_depth: usize,
}

/// Read-mostly operator view over the store.
#[derive(Clone)]
pub struct Admin {
    store: Arc<dyn Store>,
}

impl Admin {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Names of every topic with data in the store, sorted.
    pub async fn list_topics(&self) -> Result<Vec<String>> {
        let names: BTreeSet<String> = self
            .store
            .keys()
            .await?
            .iter()
            .filter_map(|key| Topic::from_key(key))
            .map(|topic| topic.name().to_string())
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn list_queue(&self, topic: &Topic, which: QueueKind) -> Result<Vec<MessageId>> {
        self.store.list_contents(&which.key(topic)).await
    }

    /// Drop every message currently in `which`, payloads included.
    ///
    /// Works on a snapshot; an id is counted (and its payload deleted) only
    /// if this call is the one that removed it, so a message consumed or
    /// committed concurrently is left alone.
    pub async fn purge_queue(&self, topic: &Topic, which: QueueKind) -> Result<usize> {
        let list = which.key(topic);
        let payloads = topic.payloads_key();
        let mut removed = 0;

        for id in self.store.list_contents(&list).await? {
            if self.store.remove(&list, &id).await? {
                self.store.hash_del(&payloads, &id).await?;
                removed += 1;
            }
        }

        info!(topic = topic.name(), queue = %which, removed, "purged");
        Ok(removed)
    }

    pub async fn info(&self, topic: &Topic) -> Result<TopicInfo> {
        let backlog_depth = self.store.list_contents(&topic.backlog_key()).await?.len();
        let nextlog_depth = self.store.list_contents(&topic.nextlog_key()).await?.len();
        Ok(TopicInfo {
            topic: topic.name().to_string(),
            backlog_depth,
            nextlog_depth,
        })
    }
}
