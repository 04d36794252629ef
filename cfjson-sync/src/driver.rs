//! Async driver connecting a [`Replica`] to a [`Broadcast`].
//!
//! Two background tasks run per replica: one feeds the joined stream into the
//! replica, the other drains the outbound queue, retrying each operation until
//! the transport accepts it. A single queue keeps the replica's own
//! operations in the order they were issued.

use crate::error::{SyncError, SyncResult};
use crate::replica::Replica;
use crate::transport::Broadcast;
use cfjson_crdt::{Cursor, ItemId, Operation, ReplicaId, Snapshot, Value, VectorClock};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A replica kept in sync through a broadcast.
pub struct SyncedReplica {
    id: ReplicaId,
    replica: Arc<Mutex<Replica>>,
    outbound: Option<mpsc::UnboundedSender<Operation>>,
    inbound_task: Option<JoinHandle<()>>,
    outbound_task: Option<JoinHandle<()>>,
}

impl SyncedReplica {
    /// Joins `broadcast` and starts the background tasks.
    ///
    /// The replica must not have made local edits yet: only edits made
    /// through the driver are queued for publishing.
    pub async fn start<B>(replica: Replica, broadcast: Arc<B>) -> SyncResult<Self>
    where
        B: Broadcast + 'static,
    {
        let id = replica.id();
        let issued = replica.clock().get(&id);
        if issued != 0 {
            return Err(SyncError::Protocol(format!(
                "replica {id} already has {issued} unpublished local edits"
            )));
        }
        let name = replica.config().name.clone();
        let retry = replica.config().retry_interval();
        let mut incoming = broadcast.join(id).await?;
        info!(replica = %name, %id, "starting sync");

        let replica = Arc::new(Mutex::new(replica));
        let (outbound, queue) = mpsc::unbounded_channel();

        let inbound_task = {
            let replica = Arc::clone(&replica);
            let name = name.clone();
            tokio::spawn(async move {
                while let Some(op) = incoming.next().await {
                    if let Err(err) = replica.lock().await.receive(op) {
                        warn!(replica = %name, error = %err, "dropped incoming operation");
                    }
                }
                debug!(replica = %name, "incoming stream ended");
            })
        };
        let outbound_task = tokio::spawn(publish_loop(broadcast, queue, retry, name));

        Ok(Self {
            id,
            replica,
            outbound: Some(outbound),
            inbound_task: Some(inbound_task),
            outbound_task: Some(outbound_task),
        })
    }

    /// This replica's id.
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// Shared handle to the underlying replica.
    pub fn replica(&self) -> &Arc<Mutex<Replica>> {
        &self.replica
    }

    /// Visible state of the local document.
    pub async fn snapshot(&self) -> Snapshot {
        self.replica.lock().await.snapshot()
    }

    /// Plain JSON rendering of the local document.
    pub async fn to_json(&self) -> serde_json::Value {
        self.replica.lock().await.to_json()
    }

    /// The local vector clock.
    pub async fn clock(&self) -> VectorClock {
        self.replica.lock().await.clock().clone()
    }

    /// Subscribes to document changes.
    pub async fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.replica.lock().await.subscribe()
    }

    // ── Local edits ──────────────────────────────────────────────
    //
    // Each edit is queued while the replica lock is held, so the queue order
    // matches clock order.

    /// Replaces the node at `cursor` with `value` and broadcasts the edit.
    pub async fn assign(&self, cursor: Cursor, value: Value) -> SyncResult<Operation> {
        let mut replica = self.replica.lock().await;
        let op = replica.assign(cursor, value)?;
        self.enqueue(&op)?;
        Ok(op)
    }

    /// Replaces the node at `cursor` with plain JSON and broadcasts the edit.
    pub async fn assign_json(
        &self,
        cursor: Cursor,
        json: &serde_json::Value,
    ) -> SyncResult<Operation> {
        let mut replica = self.replica.lock().await;
        let op = replica.assign_json(cursor, json)?;
        self.enqueue(&op)?;
        Ok(op)
    }

    /// Inserts a list item and broadcasts the edit.
    pub async fn insert(&self, cursor: Cursor, value: Value) -> SyncResult<ItemId> {
        let mut replica = self.replica.lock().await;
        let (id, op) = replica.insert(cursor, value)?;
        self.enqueue(&op)?;
        Ok(id)
    }

    /// Inserts plain JSON as a list item and broadcasts the edit.
    pub async fn insert_json(&self, cursor: Cursor, json: &serde_json::Value) -> SyncResult<ItemId> {
        let mut replica = self.replica.lock().await;
        let (id, op) = replica.insert_json(cursor, json)?;
        self.enqueue(&op)?;
        Ok(id)
    }

    /// Tombstones the node at `cursor` and broadcasts the edit.
    pub async fn delete(&self, cursor: Cursor) -> SyncResult<Operation> {
        let mut replica = self.replica.lock().await;
        let op = replica.delete(cursor)?;
        self.enqueue(&op)?;
        Ok(op)
    }

    fn enqueue(&self, op: &Operation) -> SyncResult<()> {
        self.outbound
            .as_ref()
            .ok_or(SyncError::ChannelClosed)?
            .send(op.clone())
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Stops receiving, then waits until every queued operation has been
    /// published. While the transport refuses, this keeps retrying.
    pub async fn close(mut self) -> SyncResult<()> {
        if let Some(task) = self.inbound_task.take() {
            task.abort();
        }
        drop(self.outbound.take());
        if let Some(task) = self.outbound_task.take() {
            task.await.map_err(|err| {
                warn!(replica = %self.id, error = %err, "publish task failed");
                SyncError::ChannelClosed
            })?;
        }
        debug!(replica = %self.id, "outbound queue drained");
        Ok(())
    }

    /// Stops the background tasks. Operations still queued are not published;
    /// use [`SyncedReplica::close`] to flush them first.
    pub fn shutdown(mut self) {
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in [self.inbound_task.take(), self.outbound_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

impl Drop for SyncedReplica {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

/// Publishes queued operations one at a time. A refused operation is retried
/// every `retry` until accepted; later operations wait behind it.
async fn publish_loop<B>(
    broadcast: Arc<B>,
    mut queue: mpsc::UnboundedReceiver<Operation>,
    retry: Duration,
    name: String,
) where
    B: Broadcast + 'static,
{
    while let Some(op) = queue.recv().await {
        let mut attempts = 1u32;
        while let Err(err) = broadcast.publish(&op).await {
            warn!(
                replica = %name,
                action = %op.action_id(),
                attempts,
                error = %err,
                "publish failed, retrying"
            );
            tokio::time::sleep(retry).await;
            attempts += 1;
        }
        debug!(replica = %name, action = %op.action_id(), "published");
    }
}
