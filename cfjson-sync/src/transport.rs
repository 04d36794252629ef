//! Transport layer abstraction.
//!
//! Replicas exchange operations through a [`Broadcast`]: every published
//! operation reaches every other replica, in the order its sender published
//! it. Nothing else is assumed; the causal buffer deals with the rest.

use crate::error::SyncResult;
use async_trait::async_trait;
use cfjson_crdt::{Operation, ReplicaId};
use futures::stream::BoxStream;

/// Stream of operations handed to a joined replica.
pub type OperationStream = BoxStream<'static, Operation>;

/// A broadcast channel shared by all replicas of a document.
#[async_trait]
pub trait Broadcast: Send + Sync {
    /// Publishes an operation to every other replica. An `Err` means the
    /// operation was not accepted and should be published again.
    async fn publish(&self, op: &Operation) -> SyncResult<()>;

    /// Joins the channel as `replica`.
    ///
    /// The stream first replays every operation published so far, in
    /// per-sender publish order, then yields live operations. Operations
    /// published by `replica` itself are never included.
    async fn join(&self, replica: ReplicaId) -> SyncResult<OperationStream>;
}

/// An in-process broadcast for tests and single-process deployments.
pub mod memory {
    use super::*;
    use crate::error::SyncError;
    use futures::StreamExt;
    use futures::stream;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::{Mutex, Notify};
    use tracing::{info, warn};

    struct Shared {
        /// Every accepted operation, encoded as it would travel on the wire.
        log: Mutex<Vec<String>>,
        appended: Notify,
        connected: AtomicBool,
    }

    /// Append-only operation log with one read cursor per joined replica.
    #[derive(Clone)]
    pub struct MemoryBroadcast {
        shared: Arc<Shared>,
    }

    impl MemoryBroadcast {
        /// Creates an empty, connected broadcast.
        pub fn new() -> Self {
            Self {
                shared: Arc::new(Shared {
                    log: Mutex::new(Vec::new()),
                    appended: Notify::new(),
                    connected: AtomicBool::new(true),
                }),
            }
        }

        /// Simulates losing (or regaining) the connection. While
        /// disconnected, `publish` fails and nothing is appended.
        pub fn set_connected(&self, connected: bool) {
            self.shared.connected.store(connected, Ordering::SeqCst);
        }

        /// Whether publishing currently succeeds.
        pub fn is_connected(&self) -> bool {
            self.shared.connected.load(Ordering::SeqCst)
        }

        /// Number of operations published so far.
        pub async fn len(&self) -> usize {
            self.shared.log.lock().await.len()
        }

        /// Returns true if nothing has been published.
        pub async fn is_empty(&self) -> bool {
            self.len().await == 0
        }
    }

    impl Default for MemoryBroadcast {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Broadcast for MemoryBroadcast {
        async fn publish(&self, op: &Operation) -> SyncResult<()> {
            if !self.is_connected() {
                return Err(SyncError::Network("broadcast disconnected".into()));
            }
            let line = op.to_json()?;
            self.shared.log.lock().await.push(line);
            self.shared.appended.notify_waiters();
            Ok(())
        }

        async fn join(&self, replica: ReplicaId) -> SyncResult<OperationStream> {
            let history = self.len().await;
            info!(%replica, history, "replica joined broadcast");

            let shared = Arc::clone(&self.shared);
            let stream = stream::unfold((shared, 0usize), move |(shared, mut cursor)| async move {
                loop {
                    let line = {
                        // Registered before the log is checked, so an append
                        // between the check and the wait is not missed.
                        let appended = shared.appended.notified();
                        let line = shared.log.lock().await.get(cursor).cloned();
                        match line {
                            Some(line) => line,
                            None => {
                                appended.await;
                                continue;
                            }
                        }
                    };
                    cursor += 1;
                    match Operation::from_json(&line) {
                        Ok(op) if op.sender() == replica => {}
                        Ok(op) => return Some((op, (shared, cursor))),
                        Err(err) => {
                            warn!(%replica, position = cursor - 1, error = %err, "skipping undecodable log entry");
                        }
                    }
                }
            });
            Ok(stream.boxed())
        }
    }
}
