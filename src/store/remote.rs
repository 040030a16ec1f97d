//! Client side of the store server protocol.
//!
//! A `RemoteStore` owns one WebSocket connection and sends one request per
//! primitive, waiting for the matching response before the next request goes
//! out. Atomicity of `move_atomic` is provided by the server's backend.
//! Connection failures surface as `StoreUnavailable` and are never retried
//! here.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use tungstenite::protocol::Message as WsMessage;

use super::Store;
use crate::transport::message::{StoreRequest, StoreResponse};
use crate::utils::{QueueError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Connection {
    stream: WsStream,
    // set while a request awaits its response; still set on entry means an
    // earlier call was dropped mid-flight and the stream is out of step
    in_flight: bool,
}

pub struct RemoteStore {
    url: String,
    conn: Mutex<Connection>,
}

impl RemoteStore {
    /// Connect to a store server at `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let url = format!("ws://{host}:{port}");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| QueueError::StoreUnavailable(format!("{url}: {e}")))?;
        debug!("connected to store server at {url}");
        Ok(Self {
            url,
            conn: Mutex::new(Connection {
                stream,
                in_flight: false,
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the close handshake. Further calls fail with `StoreUnavailable`.
    pub async fn close(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        conn.stream.close(None).await.map_err(|e| self.unavailable(e))
    }

    fn unavailable(&self, e: impl std::fmt::Display) -> QueueError {
        QueueError::StoreUnavailable(format!("{}: {e}", self.url))
    }

    async fn call(&self, request: StoreRequest) -> Result<StoreResponse> {
        let text = serde_json::to_string(&request)?;
        let mut conn = self.conn.lock().await;
        if conn.in_flight {
            return Err(self.unavailable("connection out of step after a cancelled request"));
        }
        conn.in_flight = true;
        conn.stream
            .send(WsMessage::text(text))
            .await
            .map_err(|e| self.unavailable(e))?;

        loop {
            match conn.stream.next().await {
                Some(Ok(WsMessage::Text(reply))) => {
                    conn.in_flight = false;
                    return match serde_json::from_str::<StoreResponse>(reply.as_str())? {
                        StoreResponse::Error { message } => Err(QueueError::Remote(message)),
                        response => Ok(response),
                    };
                }
                Some(Ok(WsMessage::Close(_))) | None => {
                    return Err(self.unavailable("connection closed by server"));
                }
                Some(Ok(WsMessage::Binary(_))) => {
                    return Err(QueueError::Protocol(
                        "unexpected binary frame from store server".to_string(),
                    ));
                }
                // ping/pong are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(self.unavailable(e)),
            }
        }
    }
}

fn unexpected(expected: &str, got: StoreResponse) -> QueueError {
    QueueError::Protocol(format!("expected {expected} response, got {got:?}"))
}

#[async_trait]
impl Store for RemoteStore {
    async fn append(&self, list: &str, value: &str) -> Result<()> {
        let request = StoreRequest::Append {
            list: list.to_string(),
            value: value.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Ok => Ok(()),
            other => Err(unexpected("ok", other)),
        }
    }

    async fn move_atomic(&self, src: &str, dst: &str) -> Result<Option<String>> {
        let request = StoreRequest::MoveAtomic {
            src: src.to_string(),
            dst: dst.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Moved { value } => Ok(value),
            other => Err(unexpected("moved", other)),
        }
    }

    async fn remove(&self, list: &str, value: &str) -> Result<bool> {
        let request = StoreRequest::Remove {
            list: list.to_string(),
            value: value.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Removed { found } => Ok(found),
            other => Err(unexpected("removed", other)),
        }
    }

    async fn hash_set(&self, map: &str, field: &str, value: &[u8]) -> Result<()> {
        let request = StoreRequest::HashSet {
            map: map.to_string(),
            field: field.to_string(),
            value: value.to_vec(),
        };
        match self.call(request).await? {
            StoreResponse::Ok => Ok(()),
            other => Err(unexpected("ok", other)),
        }
    }

    async fn hash_get(&self, map: &str, field: &str) -> Result<Option<Vec<u8>>> {
        let request = StoreRequest::HashGet {
            map: map.to_string(),
            field: field.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Value { value } => Ok(value),
            other => Err(unexpected("value", other)),
        }
    }

    async fn hash_del(&self, map: &str, field: &str) -> Result<bool> {
        let request = StoreRequest::HashDel {
            map: map.to_string(),
            field: field.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Removed { found } => Ok(found),
            other => Err(unexpected("removed", other)),
        }
    }

    async fn list_contents(&self, list: &str) -> Result<Vec<String>> {
        let request = StoreRequest::ListContents {
            list: list.to_string(),
        };
        match self.call(request).await? {
            StoreResponse::Items { items } => Ok(items),
            other => Err(unexpected("items", other)),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        match self.call(StoreRequest::Keys).await? {
            StoreResponse::Items { items } => Ok(items),
            other => Err(unexpected("items", other)),
        }
    }
}

impl std::fmt::Debug for RemoteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStore")
            .field("url", &self.url)
            .finish()
    }
}
