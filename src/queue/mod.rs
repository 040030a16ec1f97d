//! The queue itself: topics, messages and the components that move message
//! ids between a topic's backlog and nextlog.
//!
//! Every component holds an `Arc<dyn Store>` handed in by the caller and
//! keeps no other state, so any number of them may run concurrently across
//! processes as long as they share the store.

pub mod admin;
pub mod consumer;
pub mod harvester;
pub mod message;
pub mod producer;
pub mod topic;

pub use admin::{Admin, QueueKind, TopicInfo};
pub use consumer::{Backoff, ConsumeOptions, Consumer};
pub use harvester::Harvester;
pub use message::{Message, MessageId, Payload};
pub use producer::Producer;
pub use topic::Topic;
