//! Mutation observation.
//!
//! A [`MutationObserver`] is a queue of [`MutationRecord`]s for one observed
//! subtree. The document pushes records as it is mutated and calls the
//! observer's waker; consumers drain the queue whenever it suits them, so
//! several real changes are typically delivered as one batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::document::ElementId;
use crate::logging::targets;

/// What changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// The target was inserted under `parent`.
    Added {
        /// The new parent of the target.
        parent: ElementId,
    },
    /// The target was detached from `parent` (or destroyed while attached).
    Removed {
        /// The former parent of the target.
        parent: ElementId,
    },
    /// An attribute of the target changed (`class` included).
    Attribute {
        /// The attribute name.
        name: String,
    },
}

/// A single reported change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    /// The element the change is about.
    pub target: ElementId,
    /// The kind of change.
    pub kind: MutationKind,
}

impl MutationRecord {
    /// The element whose subtree must contain the change for it to be observed.
    pub(crate) fn scope(&self) -> ElementId {
        match &self.kind {
            MutationKind::Added { parent } | MutationKind::Removed { parent } => *parent,
            MutationKind::Attribute { .. } => self.target,
        }
    }
}

type Waker = Box<dyn Fn() + Send + Sync + 'static>;

pub(crate) struct ObserverQueue {
    root: ElementId,
    records: Mutex<Vec<MutationRecord>>,
    connected: AtomicBool,
    waker: Waker,
}

impl ObserverQueue {
    pub(crate) fn root(&self) -> ElementId {
        self.root
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn push(&self, record: MutationRecord) {
        if !self.is_connected() {
            return;
        }
        tracing::trace!(target: targets::MUTATION, ?record, "queued mutation record");
        self.records.lock().push(record);
        (self.waker)();
    }
}

/// Handle to a registered observation.
///
/// Dropping the handle does not disconnect it; call [`disconnect`](Self::disconnect).
pub struct MutationObserver {
    queue: Arc<ObserverQueue>,
}

impl MutationObserver {
    pub(crate) fn new(root: ElementId, waker: Waker) -> (Self, Arc<ObserverQueue>) {
        let queue = Arc::new(ObserverQueue {
            root,
            records: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
            waker,
        });
        (
            Self {
                queue: Arc::clone(&queue),
            },
            queue,
        )
    }

    /// The observed subtree root.
    pub fn root(&self) -> ElementId {
        self.queue.root
    }

    /// Drain every record queued since the last call.
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.queue.records.lock())
    }

    /// Number of records waiting to be taken.
    pub fn pending(&self) -> usize {
        self.queue.records.lock().len()
    }

    /// Stop receiving records and discard anything queued.
    pub fn disconnect(&self) {
        if self.queue.connected.swap(false, Ordering::AcqRel) {
            tracing::debug!(target: targets::MUTATION, root = ?self.queue.root, "observer disconnected");
        }
        self.queue.records.lock().clear();
    }

    /// Whether the observer still receives records.
    pub fn is_connected(&self) -> bool {
        self.queue.is_connected()
    }
}

impl std::fmt::Debug for MutationObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationObserver")
            .field("root", &self.queue.root)
            .field("connected", &self.is_connected())
            .finish()
    }
}
