//! Chain node shared by the ordered list and the FIFO queue
//!
//! Nodes are heap blocks linked by raw pointers. A container owns every
//! node reachable from its head; a node is turned back into a `Box` only
//! once it is unlinked.

use alloc::boxed::Box;
use core::ptr::NonNull;

/// Link to the next node, `None` at the end of the chain
pub(crate) type Link<T> = Option<NonNull<Node<T>>>;

/// One link of a singly-linked chain
#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) next: Link<T>,
}

impl<T> Node<T> {
    /// Allocate a detached node
    pub(crate) fn alloc(value: T) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Self { value, next: None })))
    }

    /// Take back a node that no chain links to any more
    ///
    /// # Safety
    ///
    /// `node` came from [`Node::alloc`], has not been freed, and nothing
    /// will reach it through a link afterwards.
    pub(crate) unsafe fn free(node: NonNull<Self>) -> Self {
        // SAFETY: upheld by the caller.
        unsafe { *Box::from_raw(node.as_ptr()) }
    }
}

/// Release a chain node by node
///
/// # Safety
///
/// Every node reachable from `head` is owned by the caller and is not
/// reached by any other link afterwards.
pub(crate) unsafe fn drop_chain<T>(mut head: Link<T>) {
    while let Some(node) = head {
        // SAFETY: upheld by the caller, one node at a time.
        head = unsafe { Node::free(node) }.next;
    }
}
