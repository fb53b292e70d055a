use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

/// Thread-safe FIFO queue.
///
/// Items are only touched while the inner lock is held. Consumers that would
/// rather wait than poll use [`BlockingQueue::blocking_dequeue`].
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> BlockingQueue<T> {
    /// Create an empty queue.
    pub fn new() -> Self {
        BlockingQueue {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    /// Number of queued items.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Append `item` to the tail and wake every blocked consumer.
    pub fn enqueue(&self, item: T) {
        self.items.lock().push_back(item);
        // waiters re-check emptiness, the losers go back to sleep
        self.not_empty.notify_all();
    }

    /// Pop the head without blocking.
    pub fn dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Pop the head, waiting for an `enqueue` while the queue is empty.
    pub fn blocking_dequeue(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }

    /// Remove the first `n` items.
    ///
    /// All or nothing: with fewer than `n` items queued an empty `Vec` is
    /// returned and the queue is left untouched.
    pub fn dequeue_n(&self, n: usize) -> Vec<T> {
        let mut items = self.items.lock();
        if items.len() < n {
            return Vec::new();
        }
        items.drain(..n).collect()
    }

    /// Remove every queued item.
    pub fn dequeue_all(&self) -> Vec<T> {
        let mut items = self.items.lock();
        items.drain(..).collect()
    }

    /// Drop every queued item. Blocked consumers keep waiting.
    pub fn reset(&self) {
        self.items.lock().clear();
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        BlockingQueue::new()
    }
}
