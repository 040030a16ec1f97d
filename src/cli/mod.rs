//! The `rfq` command line.
//!
//! `serve` runs the store server; every other subcommand is a queue
//! operation against either that server (`--host`/`--port`, or
//! `QUEUE_STORE_HOST`/`QUEUE_STORE_PORT`) or a local sled database (`--db`).
//! Results are written to the sink handed to [`run`], diagnostics go through
//! `tracing`, and [`exit_code`] maps the outcome to the process status.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info, warn};

use crate::Result;
use crate::config::{Settings, load_config_from};
use crate::queue::{
    Admin, Backoff, ConsumeOptions, Consumer, Harvester, Payload, Producer, QueueKind, Topic,
};
use crate::store::{MemoryStore, RemoteStore, SledStore, Store};
use crate::transport;

#[derive(Parser, Debug)]
#[command(name = "rfq", about = "Reliable FIFO work queue")]
pub struct Cli {
    /// Store server host (overrides configuration)
    #[arg(long, global = true)]
    pub host: Option<String>,
    /// Store server port (overrides configuration)
    #[arg(long, global = true)]
    pub port: Option<u16>,
    /// Operate on a local sled database instead of a store server
    #[arg(long, global = true)]
    pub db: Option<String>,
    /// Configuration file (default: config/default.*)
    #[arg(long, global = true)]
    pub config: Option<String>,
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the store server
    Serve {
        /// Keep everything in memory instead of the sled database
        #[arg(long)]
        in_memory: bool,
    },
    #[command(flatten)]
    Queue(QueueCommand),
}

#[derive(Subcommand, Debug)]
pub enum QueueCommand {
    /// Show backlog and nextlog depth for one topic or all of them
    Info {
        #[arg(long)]
        topic: Option<String>,
    },
    /// List every topic holding data
    ListTopics,
    /// List the message ids of a topic's queue
    ListQueue {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value_t = QueueKind::Backlog)]
        queue: QueueKind,
    },
    /// Delete every message in a topic's queue
    PurgeQueue {
        #[arg(long)]
        topic: String,
        #[arg(long, default_value_t = QueueKind::Backlog)]
        queue: QueueKind,
    },
    /// Publish a flat JSON object
    Publish {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        message: String,
    },
    /// Take the next message off the backlog
    Consume {
        #[arg(long)]
        topic: String,
        /// Give up after this many seconds (default: wait forever)
        #[arg(long)]
        timeout: Option<u64>,
        /// Return immediately when the backlog is empty
        #[arg(long)]
        no_wait: bool,
        /// Commit the message right after printing it
        #[arg(long)]
        commit: bool,
    },
    /// Acknowledge a consumed message
    Commit {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        id: String,
    },
    /// Return in-flight messages to the backlog
    Harvest {
        #[arg(long)]
        topic: String,
    },
}

/// Process status for the outcome of [`run`]: 0 on success, 1 on any error.
pub fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Store handle owned by the CLI for the duration of one command.
enum Backend {
    Local(SledStore),
    Remote(Arc<RemoteStore>),
}

impl Backend {
    async fn open(settings: &Settings, db: Option<&str>) -> Result<Self> {
        match db {
            Some(path) => Ok(Backend::Local(SledStore::open(path)?)),
            None => {
                let store = RemoteStore::connect(&settings.store.host, settings.store.port).await?;
                Ok(Backend::Remote(Arc::new(store)))
            }
        }
    }

    fn handle(&self) -> Arc<dyn Store> {
        match self {
            Backend::Local(store) => Arc::new(store.clone()),
            Backend::Remote(store) => store.clone(),
        }
    }

    async fn shutdown(self) -> Result<()> {
        match self {
            Backend::Local(store) => store.flush(),
            Backend::Remote(store) => store.close().await,
        }
    }
}

/// Execute one parsed command line, writing results to `out`.
pub async fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let mut settings = load_config_from(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.store.host = host;
    }
    if let Some(port) = cli.port {
        settings.store.port = port;
    }

    match cli.command {
        Command::Serve { in_memory } => run_server(&settings, in_memory).await,
        Command::Queue(command) => {
            let backend = Backend::open(&settings, cli.db.as_deref()).await?;
            let result = execute(command, backend.handle(), &settings, out).await;
            let closed = backend.shutdown().await;
            result.and(closed)
        }
    }
}

async fn run_server(settings: &Settings, in_memory: bool) -> Result<()> {
    let listener = transport::bind(&settings.store_addr()).await?;

    let sled = if in_memory {
        None
    } else {
        Some(SledStore::open(&settings.store.path)?)
    };
    let store: Arc<dyn Store> = match &sled {
        Some(store) => Arc::new(store.clone()),
        None => Arc::new(MemoryStore::new()),
    };

    tokio::select! {
        _ = transport::serve(listener, store) => {
            error!("Store server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    if let Some(store) = sled {
        store.flush()?;
    }
    Ok(())
}

async fn execute<W: Write>(
    command: QueueCommand,
    store: Arc<dyn Store>,
    settings: &Settings,
    out: &mut W,
) -> Result<()> {
    match command {
        QueueCommand::Info { topic } => {
            let admin = Admin::new(store);
            let topics = match topic {
                Some(name) => vec![Topic::new(&name)?],
                None => admin
                    .list_topics()
                    .await?
                    .iter()
                    .map(|name| Topic::new(name))
                    .collect::<Result<Vec<_>>>()?,
            };
            for topic in topics {
                let info = admin.info(&topic).await?;
                writeln!(out, "{}", serde_json::to_string(&info)?)?;
            }
        }
        QueueCommand::ListTopics => {
            for name in Admin::new(store).list_topics().await? {
                writeln!(out, "{name}")?;
            }
        }
        QueueCommand::ListQueue { topic, queue } => {
            let topic = Topic::new(&topic)?;
            for id in Admin::new(store).list_queue(&topic, queue).await? {
                writeln!(out, "{id}")?;
            }
        }
        QueueCommand::PurgeQueue { topic, queue } => {
            let topic = Topic::new(&topic)?;
            let removed = Admin::new(store).purge_queue(&topic, queue).await?;
            writeln!(out, "{removed}")?;
        }
        QueueCommand::Publish { topic, message } => {
            let topic = Topic::new(&topic)?;
            let payload = Payload::from_json_str(&message)?;
            let id = Producer::new(store).publish(&topic, payload).await?;
            writeln!(out, "{id}")?;
        }
        QueueCommand::Consume {
            topic,
            timeout,
            no_wait,
            commit,
        } => {
            let topic = Topic::new(&topic)?;
            let consumer = Consumer::new(store).with_backoff(Backoff::from(&settings.consumer));
            let options = if no_wait {
                ConsumeOptions::no_wait()
            } else {
                ConsumeOptions {
                    block: true,
                    timeout: timeout.map(Duration::from_secs),
                }
            };

            if let Some(message) = consumer.consume(&topic, options).await? {
                let printed = json!({
                    "id": message.id,
                    "created_at": message.created_at,
                    "payload": message.payload.to_json(),
                });
                writeln!(out, "{printed}")?;
                if commit && !consumer.commit(&topic, &message.id).await? {
                    warn!(
                        topic = topic.name(),
                        id = %message.id,
                        "message left nextlog before it could be committed"
                    );
                }
            }
        }
        QueueCommand::Commit { topic, id } => {
            let topic = Topic::new(&topic)?;
            let committed = Consumer::new(store).commit(&topic, &id).await?;
            writeln!(out, "{committed}")?;
        }
        QueueCommand::Harvest { topic } => {
            let topic = Topic::new(&topic)?;
            let moved = Harvester::new(store).harvest(&topic).await?;
            writeln!(out, "{moved}")?;
        }
    }
    Ok(())
}
