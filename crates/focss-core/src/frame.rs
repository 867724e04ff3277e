//! Per-frame batching of visible work.
//!
//! The [`FrameScheduler`] collects one-shot callbacks and runs them together
//! when the host signals a new frame, the way `requestAnimationFrame` does in a
//! browser. Callbacks requested while a frame is running are deferred to the
//! next frame.
//!
//! # Example
//!
//! ```
//! use focss_core::FrameScheduler;
//!
//! let scheduler = FrameScheduler::new();
//! scheduler.request_frame(|frame| println!("painting frame {frame}"));
//!
//! // In the host's render loop:
//! assert_eq!(scheduler.run_frame(), 1);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::{span_names, targets};

new_key_type! {
    /// A unique identifier for a pending frame callback.
    pub struct FrameRequestId;
}

/// A boxed frame callback; receives the number of the frame being run.
type FrameCallback = Box<dyn FnOnce(u64) + Send + 'static>;

/// Pending callbacks in request order.
struct FrameQueue {
    callbacks: SlotMap<FrameRequestId, FrameCallback>,
    order: Vec<FrameRequestId>,
    frame: u64,
}

impl FrameQueue {
    fn new() -> Self {
        Self {
            callbacks: SlotMap::with_key(),
            order: Vec::new(),
            frame: 0,
        }
    }
}

/// A cloneable handle to a frame callback queue.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Arc<Mutex<FrameQueue>>,
}

impl FrameScheduler {
    /// Create a scheduler with no pending callbacks.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FrameQueue::new())),
        }
    }

    /// Run `callback` once, on the next frame.
    pub fn request_frame<F>(&self, callback: F) -> FrameRequestId
    where
        F: FnOnce(u64) + Send + 'static,
    {
        let mut queue = self.inner.lock();
        let id = queue.callbacks.insert(Box::new(callback));
        queue.order.push(id);
        tracing::trace!(target: targets::FRAME, ?id, "frame requested");
        id
    }

    /// Cancel a pending callback. Returns `false` if it already ran or was cancelled.
    pub fn cancel(&self, id: FrameRequestId) -> bool {
        let mut queue = self.inner.lock();
        let removed = queue.callbacks.remove(id).is_some();
        if removed {
            queue.order.retain(|&pending| pending != id);
        }
        removed
    }

    /// Number of callbacks waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.inner.lock().callbacks.len()
    }

    /// Number of frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.lock().frame
    }

    /// Run every callback requested before this call, in request order.
    ///
    /// The queue lock is released before any callback runs, so callbacks may
    /// request further frames. Returns the number of callbacks executed.
    pub fn run_frame(&self) -> usize {
        let (frame, callbacks) = {
            let mut queue = self.inner.lock();
            queue.frame += 1;
            let order = std::mem::take(&mut queue.order);
            let callbacks: Vec<FrameCallback> = order
                .into_iter()
                .filter_map(|id| queue.callbacks.remove(id))
                .collect();
            (queue.frame, callbacks)
        };

        let span = tracing::trace_span!(target: targets::FRAME, span_names::FRAME, frame);
        let _enter = span.enter();

        let count = callbacks.len();
        for callback in callbacks {
            callback(frame);
        }
        count
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.inner.lock();
        f.debug_struct("FrameScheduler")
            .field("pending", &queue.callbacks.len())
            .field("frame", &queue.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_run_in_request_order() {
        let scheduler = FrameScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            scheduler.request_frame(move |_| order.lock().push(i));
        }

        assert_eq!(scheduler.pending(), 3);
        assert_eq!(scheduler.run_frame(), 3);
        assert_eq!(*order.lock(), vec![0, 1, 2]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn cancelled_callback_does_not_run() {
        let scheduler = FrameScheduler::new();
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);

        let id = scheduler.request_frame(move |_| *flag.lock() = true);
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));

        assert_eq!(scheduler.run_frame(), 0);
        assert!(!*ran.lock());
    }

    #[test]
    fn nested_requests_wait_for_next_frame() {
        let scheduler = FrameScheduler::new();
        let frames = Arc::new(Mutex::new(Vec::new()));

        let inner_scheduler = scheduler.clone();
        let inner_frames = Arc::clone(&frames);
        scheduler.request_frame(move |frame| {
            inner_frames.lock().push(frame);
            let frames = Arc::clone(&inner_frames);
            inner_scheduler.request_frame(move |frame| frames.lock().push(frame));
        });

        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(*frames.lock(), vec![1]);
        assert_eq!(scheduler.run_frame(), 1);
        assert_eq!(*frames.lock(), vec![1, 2]);
        assert_eq!(scheduler.frame_count(), 2);
    }
}
