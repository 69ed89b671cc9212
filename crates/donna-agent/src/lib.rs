// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop and session management for the Donna calendar assistant.
//!
//! The [`AgentLoop`] receives messages from a channel adapter and fans them
//! out to per-user workers. Turns for one user run strictly in order;
//! turns for different users run concurrently. Slash commands short-circuit
//! to the command layer, everything else goes through the session engine.

pub mod commands;
pub mod session;
pub mod shutdown;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use donna_core::types::{InboundMessage, OutboundMessage, UserRecord};
use donna_core::{ChannelAdapter, DonnaError, StorageAdapter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::CommandHandler;
use crate::session::{SessionEngine, APOLOGY_MESSAGE};

/// Queue depth per user worker. A full queue drops new messages rather
/// than stalling other users.
const WORKER_QUEUE_DEPTH: usize = 32;

/// How long shutdown waits for in-flight turns.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Coordinates message flow between the channel, the session engine, and
/// the command layer.
pub struct AgentLoop {
    channel: Arc<dyn ChannelAdapter>,
    storage: Arc<dyn StorageAdapter>,
    engine: Arc<SessionEngine>,
    commands: Arc<CommandHandler>,
    workers: HashMap<String, UserWorker>,
}

struct UserWorker {
    tx: mpsc::Sender<InboundMessage>,
    handle: tokio::task::JoinHandle<()>,
}

impl AgentLoop {
    /// Creates the loop. The channel must already be connected.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        storage: Arc<dyn StorageAdapter>,
        engine: Arc<SessionEngine>,
        commands: Arc<CommandHandler>,
    ) -> Self {
        Self {
            channel,
            storage,
            engine,
            commands,
            workers: HashMap::new(),
        }
    }

    /// Runs until the cancellation token fires, then drains workers and
    /// closes storage.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), DonnaError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                msg = self.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            if let Err(e) = self.handle_inbound(inbound).await {
                                error!(error = %e, "failed to handle inbound message");
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            break;
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        self.drain_workers().await;
        self.storage.close().await?;
        info!("agent loop stopped");
        Ok(())
    }

    /// Registers the sender and routes the message to their worker.
    async fn handle_inbound(&mut self, inbound: InboundMessage) -> Result<(), DonnaError> {
        let user_id = inbound.sender_id.clone();
        debug!(user_id, channel = %inbound.channel, "handling inbound message");

        // First contact creates the user row; later contacts bump updated_at.
        self.storage
            .upsert_user(&UserRecord::new(&user_id))
            .await?;

        if let Err(e) = self.channel.send_typing(inbound.metadata.as_deref()).await {
            debug!(error = %e, "failed to send typing indicator");
        }

        let worker = self
            .workers
            .entry(user_id.clone())
            .or_insert_with(|| spawn_worker(
                user_id.clone(),
                Arc::clone(&self.channel),
                Arc::clone(&self.engine),
                Arc::clone(&self.commands),
            ));

        match worker.tx.try_send(inbound) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(user_id, "user queue full, dropping message");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(inbound)) => {
                // Worker died; replace it and retry once.
                warn!(user_id, "user worker gone, respawning");
                let worker = spawn_worker(
                    user_id.clone(),
                    Arc::clone(&self.channel),
                    Arc::clone(&self.engine),
                    Arc::clone(&self.commands),
                );
                let result = worker.tx.try_send(inbound);
                self.workers.insert(user_id.clone(), worker);
                result.map_err(|_| DonnaError::Internal(format!(
                    "failed to route message for user {user_id}"
                )))
            }
        }
    }

    /// Closes all worker queues and waits for in-flight turns to finish.
    async fn drain_workers(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        info!(count = self.workers.len(), "draining user workers");
        let workers: Vec<UserWorker> = self.workers.drain().map(|(_, w)| w).collect();
        let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;
        for worker in workers {
            drop(worker.tx);
            if tokio::time::timeout_at(deadline, worker.handle).await.is_err() {
                warn!("drain timeout reached, worker interrupted");
            }
        }
    }
}

/// Spawns the per-user worker task: processes that user's messages one at
/// a time, in arrival order.
fn spawn_worker(
    user_id: String,
    channel: Arc<dyn ChannelAdapter>,
    engine: Arc<SessionEngine>,
    commands: Arc<CommandHandler>,
) -> UserWorker {
    let (tx, mut rx) = mpsc::channel::<InboundMessage>(WORKER_QUEUE_DEPTH);
    let handle = tokio::spawn(async move {
        debug!(user_id, "user worker started");
        while let Some(inbound) = rx.recv().await {
            let reply = match commands::parse(&inbound.text) {
                Some(command) => commands.handle(&user_id, command).await,
                None => match engine.handle_turn(&user_id, &inbound.text).await {
                    Ok(text) => text,
                    // The engine degrades provider failures itself; an Err
                    // here means the turn log could not be written.
                    Err(e) => {
                        error!(user_id, error = %e, "turn not persisted, sending apology");
                        APOLOGY_MESSAGE.to_string()
                    }
                },
            };
            let out = OutboundMessage {
                channel: inbound.channel,
                content: reply,
                parse_mode: None,
                metadata: inbound.metadata,
            };
            if let Err(e) = channel.send(out).await {
                error!(user_id, error = %e, "failed to send reply");
            }
        }
        debug!(user_id, "user worker stopped");
    });
    UserWorker { tx, handle }
}
