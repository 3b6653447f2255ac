//! Child stack blocks
//!
//! Child stacks are carved downwards from just below the root stack, one
//! guard page apart. Blocks given back after a join go on a FIFO free list
//! and are handed out again before any new block is carved. This module
//! only does the address bookkeeping; mapping the memory is the caller's
//! business.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::MpQueue;
use crate::error::{Result, ThreadError};
use crate::types::{StackBounds, PAGE_SIZE};

/// Pool of equally sized stack blocks
#[derive(Debug)]
pub struct StackPool {
    /// Size of every block
    stack_size: usize,
    /// High end of the next block to carve
    next_high: AtomicUsize,
    /// Blocks returned by joined threads
    free: MpQueue<StackBounds>,
}

impl StackPool {
    /// Create a pool whose first block ends at `highest`
    pub fn new(highest: usize, stack_size: usize) -> Self {
        Self {
            stack_size,
            next_high: AtomicUsize::new(highest),
            free: MpQueue::new(),
        }
    }

    /// Take a block, reusing a returned one if possible
    pub fn acquire(&self) -> Result<StackBounds> {
        if let Some(stack) = self.free.dequeue() {
            return Ok(stack);
        }

        let stride = self
            .stack_size
            .checked_add(PAGE_SIZE)
            .ok_or(ThreadError::OutOfMemory)?;

        // Claim [high - size, high) and leave a guard page below it
        let high = self
            .next_high
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |high| {
                high.checked_sub(stride)
            })
            .map_err(|_| ThreadError::OutOfMemory)?;

        Ok(StackBounds::new(high - self.stack_size, high))
    }

    /// Give a block back for reuse
    pub fn release(&self, stack: StackBounds) {
        self.free.enqueue(stack);
    }

    /// Number of blocks waiting for reuse
    pub fn free_count(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carve_downwards_with_guard() {
        let pool = StackPool::new(0x10_0000, 2 * PAGE_SIZE);

        let first = pool.acquire().unwrap();
        assert_eq!(first, StackBounds::new(0x10_0000 - 2 * PAGE_SIZE, 0x10_0000));

        let second = pool.acquire().unwrap();
        assert_eq!(second.high, first.low - PAGE_SIZE);
        assert_eq!(second.size(), 2 * PAGE_SIZE);
    }

    #[test]
    fn test_released_blocks_reused_first() {
        let pool = StackPool::new(0x10_0000, PAGE_SIZE);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();

        pool.release(b);
        pool.release(a);
        assert_eq!(pool.free_count(), 2);

        assert_eq!(pool.acquire().unwrap(), b);
        assert_eq!(pool.acquire().unwrap(), a);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn test_exhausted_address_space() {
        let pool = StackPool::new(4 * PAGE_SIZE, PAGE_SIZE);
        assert!(pool.acquire().is_ok());
        assert_eq!(pool.acquire(), Ok(StackBounds::new(PAGE_SIZE, 2 * PAGE_SIZE)));
        assert_eq!(pool.acquire(), Err(ThreadError::OutOfMemory));
    }
}
