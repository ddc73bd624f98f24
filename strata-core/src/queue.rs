//! # Generation queue
//!
//! Batches of generation work are submitted to a queue service, fire-and-forget. Submissions carry a cache key,
//! and the service tracks only the latest submission for each key - callers asking about a key see the most recent
//! batch under it, not the one they submitted.
//!
//! Completion is reported elsewhere, by the service's own notifications.

use std::collections::VecDeque;

/// Cache key used for every canvas-originated batch.
pub const ENQUEUE_BATCH_CACHE_KEY: &str = "enqueueBatch";

pub type BatchID = uuid::Uuid;

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// Name of the invocation this node runs.
    #[serde(rename = "type")]
    pub node_type: String,
}
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct GraphEdge {
    pub source: (String, String),
    pub destination: (String, String),
}
#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Graph {
    pub id: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Batch {
    pub graph: Graph,
    pub runs: u32,
    /// Who asked, ie. `"canvas"`.
    pub origin: String,
    /// Where results go, ie. `"canvas"` or `"gallery"`.
    pub destination: String,
}
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct BatchConfig {
    pub batch: Batch,
    /// Jump the queue.
    pub prepend: bool,
}

pub trait QueueService: Send + Sync {
    /// Submit a batch. Does not wait for, nor report, the outcome.
    fn enqueue_batch(&self, batch: BatchConfig, cache_key: &'static str);
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Submission {
    pub id: BatchID,
    pub config: BatchConfig,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueueMessage {
    Enqueued {
        id: BatchID,
        cache_key: &'static str,
    },
}

struct QueueInner {
    latest: hashbrown::HashMap<&'static str, Submission>,
    pending: VecDeque<Submission>,
}

/// A queue service living in this process. Holds batches until a worker takes them.
pub struct InMemoryQueue {
    inner: parking_lot::Mutex<QueueInner>,
    on_enqueue: parking_lot::Mutex<bus::Bus<QueueMessage>>,
}
impl Default for InMemoryQueue {
    fn default() -> Self {
        Self::new()
    }
}
impl InMemoryQueue {
    const BUS_CAPACITY: usize = 64;
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: QueueInner {
                latest: hashbrown::HashMap::new(),
                pending: VecDeque::new(),
            }
            .into(),
            on_enqueue: bus::Bus::new(Self::BUS_CAPACITY).into(),
        }
    }
    /// The most recent submission under this key.
    #[must_use]
    pub fn latest(&self, cache_key: &str) -> Option<Submission> {
        self.inner.lock().latest.get(cache_key).cloned()
    }
    /// Take every batch not yet handed to a worker, in run order.
    pub fn take_pending(&self) -> Vec<Submission> {
        self.inner.lock().pending.drain(..).collect()
    }
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }
    pub fn listen(&self) -> bus::BusReader<QueueMessage> {
        self.on_enqueue.lock().add_rx()
    }
}
impl QueueService for InMemoryQueue {
    fn enqueue_batch(&self, config: BatchConfig, cache_key: &'static str) {
        let submission = Submission {
            id: uuid::Uuid::new_v4(),
            submitted_at: chrono::Utc::now(),
            config,
        };
        let id = submission.id;
        {
            let mut inner = self.inner.lock();
            if submission.config.prepend {
                inner.pending.push_front(submission.clone());
            } else {
                inner.pending.push_back(submission.clone());
            }
            inner.latest.insert(cache_key, submission);
        }
        log::debug!("Enqueued batch {id} under {cache_key:?}");
        if self
            .on_enqueue
            .lock()
            .try_broadcast(QueueMessage::Enqueued { id, cache_key })
            .is_err()
        {
            log::warn!("Queue bus full, a listener is lagging. Dropped notice of {id}");
        }
    }
}
