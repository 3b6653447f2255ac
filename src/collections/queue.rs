//! FIFO Queue - Head/tail tracked singly-linked queue
//!
//! Same node shape as the ordered list, but with no predicate: values go
//! in at the tail and come out at the head, both in O(1). Used for pools
//! of reusable resources such as stack blocks.
//!
//! [`Queue`] has no lock and needs `&mut self` to change; [`MpQueue`]
//! wraps one in a blocking mutex for shared use.

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;
use parking_lot::Mutex;

use super::node::{drop_chain, Link, Node};

// ============================================================================
// Queue
// ============================================================================

/// A FIFO queue
///
/// Both ends are `None` exactly when the queue is empty.
pub struct Queue<T> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    _owns: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send> Send for Queue<T> {}
unsafe impl<T: Sync> Sync for Queue<T> {}

impl<T> Queue<T> {
    /// Create a new empty queue
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Reset the queue to empty, releasing every value
    pub fn init(&mut self) {
        self.tail = None;
        self.len = 0;
        // SAFETY: the chain belongs to this queue and is no longer linked.
        unsafe { drop_chain(self.head.take()) };
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Number of queued values
    pub fn len(&self) -> usize {
        self.len
    }

    /// Add `value` at the tail
    pub fn enqueue(&mut self, value: T) {
        let node = Node::alloc(value);

        match self.tail {
            // SAFETY: `tail` is the last live node of this queue.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }

        self.tail = Some(node);
        self.len += 1;
    }

    /// Remove and return the value at the head
    pub fn dequeue(&mut self) -> Option<T> {
        // SAFETY: `head` is a live node of this queue and is unlinked here.
        let first = unsafe { Node::free(self.head?) };
        self.head = first.next;

        if self.head.is_none() {
            // Queue is now empty
            self.tail = None;
        }

        self.len -= 1;
        Some(first.value)
    }

    /// Value at the head, without removing it
    pub fn peek(&self) -> Option<&T> {
        // SAFETY: nodes stay live while the queue is borrowed.
        self.head.map(|node| unsafe { &(*node.as_ptr()).value })
    }
}

impl<T> Drop for Queue<T> {
    fn drop(&mut self) {
        self.tail = None;
        // SAFETY: the chain belongs to this queue and is no longer linked.
        unsafe { drop_chain(self.head.take()) };
    }
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue").field("len", &self.len).finish()
    }
}

// ============================================================================
// MpQueue - Shared FIFO
// ============================================================================

/// FIFO shared between threads
///
/// Each call takes the inner mutex for one queue operation; contending
/// callers park instead of spinning.
#[derive(Debug)]
pub struct MpQueue<T> {
    queue: Mutex<Queue<T>>,
}

impl<T> MpQueue<T> {
    /// Create an empty shared queue
    pub const fn new() -> Self {
        Self {
            queue: Mutex::new(Queue::new()),
        }
    }

    /// Append `value` at the tail
    pub fn enqueue(&self, value: T) {
        self.queue.lock().enqueue(value);
    }

    /// Take the value at the head, if any
    pub fn dequeue(&self) -> Option<T> {
        self.queue.lock().dequeue()
    }

    /// Nothing queued right now
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    /// Values queued right now
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

impl<T> Default for MpQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
