//! Common types used across uthread
//!
//! Identifiers, stack bounds and the exit-value slot type shared by the
//! thread-control records, the stack pool and the task context.

use core::fmt;

/// Size of a page; stack sizes are rounded up to a multiple of this
pub const PAGE_SIZE: usize = 4096;

// ============================================================================
// Identifiers
// ============================================================================

/// Library-assigned thread identifier
///
/// Assigned once at creation from a monotonically increasing counter and
/// never reused while the process runs. The root thread is always `ROOT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ThreadId(pub u32);

impl ThreadId {
    /// The thread that initialized the library
    pub const ROOT: Self = Self(0);

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kernel-assigned thread identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelTid(pub i32);

impl fmt::Display for KernelTid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Value a thread hands back when it exits (pointer-sized, opaque)
pub type ExitValue = usize;

// ============================================================================
// Stack Bounds
// ============================================================================

/// Address range of one thread's stack
///
/// `low` is inclusive, `high` is exclusive; stacks grow down from `high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StackBounds {
    pub low: usize,
    pub high: usize,
}

impl StackBounds {
    pub const fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Usable size in bytes
    pub fn size(&self) -> usize {
        self.high.saturating_sub(self.low)
    }

    /// Check whether `addr` lies on this stack
    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.low && addr < self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_thread_id() {
        assert!(ThreadId::ROOT.is_root());
        assert!(!ThreadId(1).is_root());
        assert_eq!(ThreadId::default(), ThreadId::ROOT);
    }

    #[test]
    fn test_stack_bounds_contains() {
        let stack = StackBounds::new(0x1000, 0x3000);
        assert_eq!(stack.size(), 0x2000);
        assert!(stack.contains(0x1000));
        assert!(stack.contains(0x2fff));
        assert!(!stack.contains(0x3000));
        assert!(!stack.contains(0xfff));
    }
}
