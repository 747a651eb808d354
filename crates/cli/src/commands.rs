//! Subcommands and their results.

use anyhow::Context;
use clap::Subcommand;
use ringkv_core::{Message, NodeDescriptor};
use ringkv_storage::memory::{DEFAULT_MAX_TOTAL_SIZE, DEFAULT_MAX_VALUE_SIZE};
use ringkv_storage::{StorageConfig, Store};
use ringkv_transport::{HttpTransport, NodeContext, NodeServer, Transport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::oneshot;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a node until interrupted.
    Serve {
        /// Address to listen on; also the node's identity on the ring.
        #[arg(env = "RINGKV_ADDRESS")]
        address: NodeDescriptor,

        /// Existing member to join through.
        #[arg(long, env = "RINGKV_JOIN")]
        join: Option<NodeDescriptor>,

        /// Largest value accepted, in bytes.
        #[arg(long, env = "RINGKV_MAX_VALUE_SIZE", default_value_t = DEFAULT_MAX_VALUE_SIZE)]
        max_value_size: usize,

        /// Total bytes of keys and values one node will hold.
        #[arg(long, env = "RINGKV_MAX_TOTAL_SIZE", default_value_t = DEFAULT_MAX_TOTAL_SIZE)]
        max_total_size: usize,
    },

    /// Print a node's predecessor and successor.
    Neighbors { node: NodeDescriptor },

    /// Print the leader a node currently knows.
    Leader { node: NodeDescriptor },

    /// Start an election at a node.
    Elect { node: NodeDescriptor },

    /// Ask a node to leave the ring.
    Leave { node: NodeDescriptor },
}

/// What a command produced, printable as text or JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    Nodes {
        nodes: Vec<NodeDescriptor>,
    },
    Sent {
        destination: NodeDescriptor,
        message: &'static str,
    },
    Stopped {
        node: NodeDescriptor,
    },
}

impl CommandResult {
    pub fn render(&self, json: bool) -> anyhow::Result<String> {
        if json {
            return Ok(serde_json::to_string(self)?);
        }
        Ok(match self {
            CommandResult::Nodes { nodes } => nodes
                .iter()
                .map(NodeDescriptor::to_string)
                .collect::<Vec<_>>()
                .join("\n"),
            CommandResult::Sent {
                destination,
                message,
            } => format!("sent {} to {}", message, destination),
            CommandResult::Stopped { node } => format!("{} stopped", node),
        })
    }
}

impl Command {
    pub async fn execute(self) -> anyhow::Result<CommandResult> {
        match self {
            Command::Serve {
                address,
                join,
                max_value_size,
                max_total_size,
            } => {
                let storage = StorageConfig {
                    max_value_size,
                    max_total_size,
                };
                serve(address, join, storage).await
            }
            Command::Neighbors { node } => query(Message::GetNeighbors { destination: node }).await,
            Command::Leader { node } => query(Message::GetLeader { destination: node }).await,
            Command::Elect { node } => {
                send(Message::Election {
                    destination: node,
                    participants: vec![],
                })
                .await
            }
            Command::Leave { node } => send(Message::Shutdown { destination: node }).await,
        }
    }
}

async fn serve(
    address: NodeDescriptor,
    join: Option<NodeDescriptor>,
    storage: StorageConfig,
) -> anyhow::Result<CommandResult> {
    let server = NodeServer::bind(address.host(), address.port())
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    let node = server.descriptor().clone();
    let ctx = Arc::new(NodeContext::start(node.clone(), Store::new(storage))?);

    let (stop, stopped) = oneshot::channel::<()>();
    let server_task = tokio::spawn(server.serve(ctx.clone(), async {
        let _ = stopped.await;
    }));

    if let Some(via) = join {
        tracing::info!(%node, %via, "joining ring");
        ctx.queue().submit(Message::Join {
            destination: via,
            new_node: node.clone(),
        })?;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    tracing::info!(%node, "interrupted");

    ctx.leave().await?;
    let _ = stop.send(());
    server_task.await??;

    Ok(CommandResult::Stopped { node })
}

async fn query(message: Message) -> anyhow::Result<CommandResult> {
    let client = HttpTransport::new()?;
    let nodes = client
        .query(&message)
        .await
        .with_context(|| format!("{} query to {} failed", message.kind(), message.destination()))?;
    Ok(CommandResult::Nodes { nodes })
}

async fn send(message: Message) -> anyhow::Result<CommandResult> {
    let client = HttpTransport::new()?;
    client
        .send(&message)
        .await
        .with_context(|| {
            format!("sending {} to {} failed", message.kind(), message.destination())
        })?;
    Ok(CommandResult::Sent {
        destination: message.destination().clone(),
        message: message.kind(),
    })
}
