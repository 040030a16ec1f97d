use std::sync::Arc;

use tracing::{info, warn};

use super::topic::Topic;
use crate::store::Store;
use crate::utils::Result;

/// Returns stranded nextlog entries to the backlog for redelivery.
///
/// Meant to run out of band, by an operator or on a timer, once the
/// consumers that took those messages are known to be gone. It cannot tell
/// a stuck message from one still being processed: harvesting a live
/// message delivers it twice.
#[derive(Clone)]
pub struct Harvester {
    store: Arc<dyn Store>,
}

impl Harvester {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Move every id present in nextlog at call time to the backlog tail.
    /// Returns how many were moved.
    pub async fn harvest(&self, topic: &Topic) -> Result<usize> {
        let nextlog = topic.nextlog_key();
        let backlog = topic.backlog_key();

        // bounded by the snapshot: ids consumed while we run stay in flight
        let depth = self.store.list_contents(&nextlog).await?.len();
        let mut moved = 0;
        for _ in 0..depth {
            match self.store.move_atomic(&nextlog, &backlog).await? {
                Some(_) => moved += 1,
                None => break,
            }
        }

        if moved > 0 {
            warn!(
                topic = topic.name(),
                moved, "harvested in-flight messages; they will be delivered again"
            );
        } else {
            info!(topic = topic.name(), "nothing to harvest");
        }
        Ok(moved)
    }
}
