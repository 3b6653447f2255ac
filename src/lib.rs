//! uthread - Coordination core of a user-level thread library
//!
//! This crate provides the shared state a user-level thread library keeps
//! on top of a kernel that only offers raw threads:
//!
//! - [`collections`]: ordered list, FIFO queue and a bucket-locked hash
//!   table with injected match/hash operations
//! - [`thread`]: thread-control records, the lazily resolved kernel id
//!   handshake, and the process-wide [`Task`] context
//! - [`sync`]: a writer-priority read/write lock built from a mutex and
//!   two condition variables
//!
//! Broken synchronization invariants panic; build with `panic = "abort"`
//! to make them halt the process.

extern crate alloc;

// Core types
pub mod config;
pub mod error;
pub mod types;

pub mod collections;
pub mod sync;
pub mod thread;

pub use config::ThreadConfig;
pub use error::{Result, ThreadError};
pub use thread::{HostKernel, Kernel, Task, Tcb, ThreadState};
pub use types::{ExitValue, KernelTid, StackBounds, ThreadId, PAGE_SIZE};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Library name
pub const NAME: &str = "uthread";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(NAME, "uthread");
        assert!(!VERSION.is_empty());
    }
}
