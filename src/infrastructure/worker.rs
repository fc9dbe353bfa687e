use crate::core::errors::LedgerError;
use crate::core::recalculation::RecalculationCoordinator;
use crate::infrastructure::storage::Storage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Sender side of the deferred recompute queue.
///
/// A group already waiting in the queue is not queued twice; one recompute
/// reads the whole ledger anyway.
#[derive(Clone)]
pub struct RecomputeQueue {
    tx: mpsc::UnboundedSender<String>,
    queued: Arc<Mutex<HashSet<String>>>,
}

impl RecomputeQueue {
    pub fn enqueue(&self, group_id: &str) -> Result<(), LedgerError> {
        {
            let mut queued = self.queued.lock().unwrap_or_else(|e| e.into_inner());
            if !queued.insert(group_id.to_string()) {
                debug!(group_id, "Recompute already queued");
                return Ok(());
            }
        }
        self.tx.send(group_id.to_string()).map_err(|_| {
            self.release(group_id);
            LedgerError::RecomputeQueueClosed
        })
    }

    fn release(&self, group_id: &str) {
        release(&self.queued, group_id);
    }
}

fn release(queued: &Mutex<HashSet<String>>, group_id: &str) {
    let mut queued = queued.lock().unwrap_or_else(|e| e.into_inner());
    queued.remove(group_id);
}

/// Handle to stop and join the background worker.
pub struct WorkerHandle {
    queue: RecomputeQueue,
    shutdown: Arc<Notify>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn queue(&self) -> RecomputeQueue {
        self.queue.clone()
    }

    /// Stops the worker after it has drained everything already queued.
    pub async fn shutdown(mut self) {
        self.shutdown.notify_one();
        if let Some(join) = self.join.take() {
            if let Err(err) = join.await {
                warn!(error = %err, "Recompute worker terminated abnormally");
            }
        }
    }
}

pub struct RecomputeWorker;

impl RecomputeWorker {
    pub fn spawn<S>(coordinator: Arc<RecalculationCoordinator<S>>) -> WorkerHandle
    where
        S: Storage + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let queue = RecomputeQueue {
            tx,
            queued: Arc::new(Mutex::new(HashSet::new())),
        };
        let shutdown = Arc::new(Notify::new());

        let join = tokio::spawn(worker_loop(coordinator, queue.queued.clone(), rx, shutdown.clone()));
        info!("Recompute worker started");

        WorkerHandle {
            queue,
            shutdown,
            join: Some(join),
        }
    }
}

async fn worker_loop<S>(
    coordinator: Arc<RecalculationCoordinator<S>>,
    queued: Arc<Mutex<HashSet<String>>>,
    mut rx: mpsc::UnboundedReceiver<String>,
    shutdown: Arc<Notify>,
) where
    S: Storage + ?Sized + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                while let Ok(group_id) = rx.try_recv() {
                    process(&coordinator, &queued, &group_id).await;
                }
                break;
            }
            next = rx.recv() => match next {
                Some(group_id) => process(&coordinator, &queued, &group_id).await,
                None => break,
            },
        }
    }
    info!("Recompute worker stopped");
}

async fn process<S>(coordinator: &RecalculationCoordinator<S>, queued: &Mutex<HashSet<String>>, group_id: &str)
where
    S: Storage + ?Sized,
{
    // Released first so a mutation landing mid-recompute queues another pass.
    release(queued, group_id);
    match coordinator.recompute(group_id).await {
        Ok(outcome) => debug!(group_id, pending = outcome.instructions.len(), "Deferred recompute done"),
        Err(err) => warn!(group_id, error = %err, "Deferred recompute failed; retried on next mutation"),
    }
}
