//! Ordered List - Singly-linked sequence with predicate lookup
//!
//! Elements keep insertion order. Removal and lookup walk the chain from
//! the head and stop at the first element the list's [`Finder`] accepts.
//!
//! ## Locking
//!
//! The list has no lock of its own. Structural operations take `&mut self`,
//! so whoever shares a list across threads must wrap it (the hash table
//! puts each bucket behind its own mutex).

use alloc::boxed::Box;
use core::fmt;
use core::marker::PhantomData;

use super::node::{drop_chain, Link, Node};

// ============================================================================
// Finder
// ============================================================================

/// Match predicate injected into a list at construction
pub trait Finder<T> {
    /// What lookups and removals are keyed by
    type Key: ?Sized;

    /// Does `elem` match `key`?
    fn matches(&self, elem: &T, key: &Self::Key) -> bool;
}

/// Finder that compares elements to keys of the same type with `==`
#[derive(Debug, Clone, Copy, Default)]
pub struct ByEq;

impl<T: PartialEq> Finder<T> for ByEq {
    type Key = T;

    fn matches(&self, elem: &T, key: &T) -> bool {
        elem == key
    }
}

// ============================================================================
// Linked List
// ============================================================================

/// An ordered, singly-linked list
///
/// `head` and `tail` are both `None` exactly when the list is empty. Every
/// node reachable from `head` belongs to the list; `tail` is the last one.
pub struct LinkedList<T, F> {
    head: Link<T>,
    tail: Link<T>,
    len: usize,
    finder: F,
    _owns: PhantomData<Box<Node<T>>>,
}

// The list owns its nodes outright, so it is as thread-safe as the values
// and finder it holds.
unsafe impl<T: Send, F: Send> Send for LinkedList<T, F> {}
unsafe impl<T: Sync, F: Sync> Sync for LinkedList<T, F> {}

impl<T, F: Finder<T>> LinkedList<T, F> {
    /// Create an empty list that matches with `finder`
    pub const fn new(finder: F) -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
            finder,
            _owns: PhantomData,
        }
    }

    /// Reset the list to empty, releasing every element
    pub fn init(&mut self) {
        self.tail = None;
        self.len = 0;
        // SAFETY: the chain belongs to this list and is no longer linked.
        unsafe { drop_chain(self.head.take()) };
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Append `value` at the tail
    pub fn insert(&mut self, value: T) {
        let node = Node::alloc(value);

        match self.tail {
            // SAFETY: `tail` is a live node of this list, and `&mut self`
            // rules out any other access to it.
            Some(mut tail) => unsafe { tail.as_mut().next = Some(node) },
            None => self.head = Some(node),
        }

        self.tail = Some(node);
        self.len += 1;
    }

    /// Remove the first element matching `key` and hand it back
    ///
    /// Returns `None` when nothing matches.
    pub fn remove(&mut self, key: &F::Key) -> Option<T> {
        let mut prev: Link<T> = None;
        let mut cursor = self.head;

        while let Some(node) = cursor {
            // SAFETY: every node reachable from `head` is live.
            let next = unsafe { node.as_ref() }.next;
            // SAFETY: as above; the shared borrow ends with the call.
            if !self.finder.matches(unsafe { &node.as_ref().value }, key) {
                prev = cursor;
                cursor = next;
                continue;
            }

            match prev {
                // SAFETY: `prev` is a live node distinct from `node`.
                Some(mut prev) => unsafe { prev.as_mut().next = next },
                None => self.head = next,
            }
            // Removed the last node: the predecessor (if any) is the new tail.
            if next.is_none() {
                self.tail = prev;
            }

            self.len -= 1;
            // SAFETY: `node` is unlinked and owned by this list.
            return Some(unsafe { Node::free(node) }.value);
        }

        None
    }

    /// Find the first element matching `key`
    pub fn lookup(&self, key: &F::Key) -> Option<&T> {
        self.iter().find(|value| self.finder.matches(value, key))
    }

    /// Iterate front to back
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            next: self.head,
            _list: PhantomData,
        }
    }
}

impl<T, F> Drop for LinkedList<T, F> {
    fn drop(&mut self) {
        self.tail = None;
        // SAFETY: the chain belongs to this list and is no longer linked.
        unsafe { drop_chain(self.head.take()) };
    }
}

impl<T, F: Finder<T> + Default> Default for LinkedList<T, F> {
    fn default() -> Self {
        Self::new(F::default())
    }
}

impl<T: fmt::Debug, F: Finder<T>> fmt::Debug for LinkedList<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

// ============================================================================
// Iterator
// ============================================================================

/// Front-to-back iterator over list elements
pub struct Iter<'a, T> {
    next: Link<T>,
    _list: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        // SAFETY: the list is borrowed for `'a`, so its nodes stay live and
        // unchanged.
        let node: &'a Node<T> = unsafe { node.as_ref() };
        self.next = node.next;
        Some(&node.value)
    }
}
