//! WebSocket store server.
//!
//! Accepts connections, decodes one [`StoreRequest`] per text frame, runs it
//! against the wrapped [`Store`] and answers with one [`StoreResponse`].
//! Frames on a connection are handled in order, so a client sees its own
//! requests applied sequentially; atomicity across clients comes from the
//! backend.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::store::Store;
use crate::transport::message::{StoreRequest, StoreResponse};
use crate::utils::{QueueError, Result};

/// Bind the listening socket for the store server.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| QueueError::StoreUnavailable(format!("cannot bind {addr}: {e}")))
}

/// Accept loop over an already bound listener.
pub async fn serve(listener: TcpListener, store: Arc<dyn Store>) {
    match listener.local_addr() {
        Ok(addr) => info!("store server listening on ws://{addr}"),
        Err(e) => warn!("store server listening on unknown address: {e}"),
    }

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let store = store.clone();
                tokio::spawn(handle_connection(stream, peer, store));
            }
            Err(e) => warn!("failed to accept connection: {e}"),
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, store: Arc<dyn Store>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    debug!(%peer, "client connected");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    while let Some(msg) = ws_receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                debug!(%peer, "read error: {e}");
                break;
            }
        };

        let response = match msg {
            WsMessage::Text(text) => match serde_json::from_str::<StoreRequest>(text.as_str()) {
                Ok(request) => handle_request(store.as_ref(), request).await,
                Err(e) => {
                    warn!(
                        %peer,
                        "invalid request: {e} | {}",
                        text.chars().take(100).collect::<String>()
                    );
                    StoreResponse::Error {
                        message: format!("invalid request: {e}"),
                    }
                }
            },
            WsMessage::Close(_) => break,
            _ => continue,
        };

        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                warn!(%peer, "failed to serialize response: {e}");
                break;
            }
        };
        if let Err(e) = ws_sender.send(WsMessage::text(json)).await {
            debug!(%peer, "failed to send response: {e}");
            break;
        }
    }

    debug!(%peer, "client disconnected");
}

/// Execute one request against `store`. Store errors become
/// [`StoreResponse::Error`] so the connection stays usable.
pub async fn handle_request(store: &dyn Store, request: StoreRequest) -> StoreResponse {
    let result = match request {
        StoreRequest::Append { list, value } => store
            .append(&list, &value)
            .await
            .map(|()| StoreResponse::Ok),
        StoreRequest::MoveAtomic { src, dst } => store
            .move_atomic(&src, &dst)
            .await
            .map(|value| StoreResponse::Moved { value }),
        StoreRequest::Remove { list, value } => store
            .remove(&list, &value)
            .await
            .map(|found| StoreResponse::Removed { found }),
        StoreRequest::HashSet { map, field, value } => store
            .hash_set(&map, &field, &value)
            .await
            .map(|()| StoreResponse::Ok),
        StoreRequest::HashGet { map, field } => store
            .hash_get(&map, &field)
            .await
            .map(|value| StoreResponse::Value { value }),
        StoreRequest::HashDel { map, field } => store
            .hash_del(&map, &field)
            .await
            .map(|found| StoreResponse::Removed { found }),
        StoreRequest::ListContents { list } => store
            .list_contents(&list)
            .await
            .map(|items| StoreResponse::Items { items }),
        StoreRequest::Keys => store.keys().await.map(|items| StoreResponse::Items { items }),
    };

    result.unwrap_or_else(|e| {
        warn!("store operation failed: {e}");
        StoreResponse::Error {
            message: e.to_string(),
        }
    })
}
