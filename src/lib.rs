//! # rfq
//!
//! `rfq` is a reliable FIFO work queue built on a small set of list and hash
//! primitives. Each topic keeps a backlog of message ids awaiting delivery,
//! a nextlog of ids checked out by consumers, and a map of payloads.
//! Delivery is at-least-once: a message left in nextlog by a crashed
//! consumer is returned to the backlog by a harvest and delivered again.
//!
//! ## Core Modules
//!
//! - `queue`: topics, messages, and the producer / consumer / harvester /
//!   admin components.
//! - `store`: the `Store` trait and its in-memory, sled and remote backends.
//! - `transport`: the WebSocket store server that lets many processes share
//!   one store.
//! - `config`: loading settings from file and environment.
//! - `utils`: error type and logging setup.
//! - `cli`: the `rfq` command line on top of the modules above.

pub mod cli;
pub mod config;
pub mod queue;
pub mod store;
pub mod transport;
pub mod utils;

pub use utils::{QueueError, Result};

#[cfg(test)]
mod tests;
