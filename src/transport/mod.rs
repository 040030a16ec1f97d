//! The `transport` module exposes a [`Store`](crate::store::Store) over
//! WebSockets so producers, consumers and operators in different processes
//! share one backing store.
//!
//! It defines the request/response protocol and the server loop. The client
//! side lives in [`crate::store::RemoteStore`].

pub mod message;
pub mod websocket;

pub use message::{StoreRequest, StoreResponse};
pub use websocket::{bind, handle_request, serve};

#[cfg(test)]
mod tests;
