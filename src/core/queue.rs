//! Durable FIFO of pending work items.
//!
//! The whole queue is one JSON array on disk, rewritten after every
//! mutation. A mutation only commits once the write succeeds; on a failed
//! write the in-memory change is rolled back so memory and disk agree.
//!
//! `WorkQueue` is the single-owner state. `QueueHandle` is the cheap,
//! cloneable front door: every call is a message to one actor task, so
//! appends from a refill and pops from a drain can never interleave.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::WorkItem;

/// Errors that can occur with the work queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue task has stopped")]
    Closed,
}

/// File-backed FIFO of work items
#[derive(Debug)]
pub struct WorkQueue {
    /// Path to the queue JSON file
    path: PathBuf,
    items: VecDeque<WorkItem>,
}

impl WorkQueue {
    /// Load the queue from `path`.
    ///
    /// A missing or unreadable file, or one that is not a JSON array of
    /// items, yields an empty queue.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let items = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Vec<WorkItem>>(&content) {
                Ok(items) => {
                    info!(count = items.len(), path = %path.display(), "Loaded queue");
                    items.into()
                }
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Queue file is not valid, starting empty");
                    VecDeque::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => VecDeque::new(),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to read queue file, starting empty");
                VecDeque::new()
            }
        };

        Self { path, items }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in queue order
    pub fn items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    /// Append a batch in arrival order, then persist. Returns the new length.
    pub async fn append(&mut self, batch: Vec<WorkItem>) -> Result<usize, QueueError> {
        let before = self.items.len();
        self.items.extend(batch);

        if let Err(e) = self.persist().await {
            self.items.truncate(before);
            return Err(e);
        }

        Ok(self.items.len())
    }

    /// Remove the earliest item and persist before handing it out.
    pub async fn pop_front(&mut self) -> Result<Option<WorkItem>, QueueError> {
        let Some(item) = self.items.pop_front() else {
            return Ok(None);
        };

        if let Err(e) = self.persist().await {
            self.items.push_front(item);
            return Err(e);
        }

        Ok(Some(item))
    }

    /// Rewrite the backing file with the full queue
    async fn persist(&self) -> Result<(), QueueError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.items)?;

        // Write beside the target then rename over it
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(count = self.items.len(), "Persisted queue");
        Ok(())
    }
}

/// Requests served by the queue task
enum QueueCommand {
    Append {
        batch: Vec<WorkItem>,
        reply: oneshot::Sender<Result<usize, QueueError>>,
    },
    Pop {
        reply: oneshot::Sender<Result<Option<WorkItem>, QueueError>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<WorkItem>>,
    },
}

/// Handle to the task that owns the `WorkQueue`
#[derive(Debug, Clone)]
pub struct QueueHandle {
    tx: mpsc::Sender<QueueCommand>,
}

impl std::fmt::Debug for QueueCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Append { .. } => "Append",
            Self::Pop { .. } => "Pop",
            Self::Len { .. } => "Len",
            Self::Snapshot { .. } => "Snapshot",
        };
        f.write_str(name)
    }
}

impl QueueHandle {
    /// Move `queue` into its own task and return a handle to it.
    ///
    /// The task exits when the last handle is dropped.
    pub fn spawn(mut queue: WorkQueue) -> Self {
        let (tx, mut rx) = mpsc::channel::<QueueCommand>(32);

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    QueueCommand::Append { batch, reply } => {
                        let _ = reply.send(queue.append(batch).await);
                    }
                    QueueCommand::Pop { reply } => {
                        let _ = reply.send(queue.pop_front().await);
                    }
                    QueueCommand::Len { reply } => {
                        let _ = reply.send(queue.len());
                    }
                    QueueCommand::Snapshot { reply } => {
                        let _ = reply.send(queue.items().cloned().collect());
                    }
                }
            }
            debug!("Queue task stopped");
        });

        Self { tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> QueueCommand,
    ) -> Result<T, QueueError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| QueueError::Closed)?;
        rx.await.map_err(|_| QueueError::Closed)
    }

    pub async fn append(&self, batch: Vec<WorkItem>) -> Result<usize, QueueError> {
        self.request(|reply| QueueCommand::Append { batch, reply })
            .await?
    }

    pub async fn pop_front(&self) -> Result<Option<WorkItem>, QueueError> {
        self.request(|reply| QueueCommand::Pop { reply }).await?
    }

    pub async fn len(&self) -> Result<usize, QueueError> {
        self.request(|reply| QueueCommand::Len { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<WorkItem>, QueueError> {
        self.request(|reply| QueueCommand::Snapshot { reply }).await
    }
}
