use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the backing store and for consumers.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub store: StoreSettings,
    pub consumer: ConsumerSettings,
}

/// Where the backing store lives.
///
/// `host`/`port` are the address the store server binds to and the address
/// clients connect to. `path` is the sled database directory `rfq serve`
/// opens; client commands use `--db` instead.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Polling behaviour of a blocking consume.
#[derive(Debug, Deserialize, Clone)]
pub struct ConsumerSettings {
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Missing values are filled from `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub store: Option<PartialStoreSettings>,
    pub consumer: Option<PartialConsumerSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialStoreSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartialConsumerSettings {
    pub poll_interval_ms: Option<u64>,
    pub max_poll_interval_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store: StoreSettings {
                host: "127.0.0.1".to_string(),
                port: 7480,
                path: "rfq_db".to_string(),
            },
            consumer: ConsumerSettings {
                poll_interval_ms: 25,
                max_poll_interval_ms: 1000,
            },
        }
    }
}

impl Settings {
    /// Overlay the values present in `partial` on top of `self`.
    pub fn merge(self, partial: PartialSettings) -> Self {
        let store = partial.store;
        let consumer = partial.consumer;

        Settings {
            store: StoreSettings {
                host: store
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(self.store.host),
                port: store
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(self.store.port),
                path: store
                    .as_ref()
                    .and_then(|s| s.path.clone())
                    .unwrap_or(self.store.path),
            },
            consumer: ConsumerSettings {
                poll_interval_ms: consumer
                    .as_ref()
                    .and_then(|c| c.poll_interval_ms)
                    .unwrap_or(self.consumer.poll_interval_ms),
                max_poll_interval_ms: consumer
                    .as_ref()
                    .and_then(|c| c.max_poll_interval_ms)
                    .unwrap_or(self.consumer.max_poll_interval_ms),
            },
        }
    }

    /// `host:port` of the store server.
    pub fn store_addr(&self) -> String {
        format!("{}:{}", self.store.host, self.store.port)
    }
}
