//! Kernel interface
//!
//! The only kernel service this layer consumes is "which kernel thread am
//! I?". Everything else (creating kernel threads, fault handlers) belongs
//! to the callers.

use alloc::sync::Arc;
use core::cell::Cell;
use core::sync::atomic::{AtomicI32, Ordering};

use crate::types::KernelTid;

/// Kernel services used by the thread library
pub trait Kernel: Send + Sync {
    /// Kernel id of the calling execution context
    fn gettid(&self) -> KernelTid;
}

impl<K: Kernel + ?Sized> Kernel for Arc<K> {
    fn gettid(&self) -> KernelTid {
        (**self).gettid()
    }
}

impl<K: Kernel + ?Sized> Kernel for &K {
    fn gettid(&self) -> KernelTid {
        (**self).gettid()
    }
}

// ============================================================================
// Host Kernel
// ============================================================================

static NEXT_HOST_TID: AtomicI32 = AtomicI32::new(1);

std::thread_local! {
    static HOST_TID: Cell<Option<KernelTid>> = const { Cell::new(None) };
}

/// Kernel backed by the host's OS threads
///
/// Each OS thread is numbered on its first query and keeps that number.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostKernel;

impl Kernel for HostKernel {
    fn gettid(&self) -> KernelTid {
        HOST_TID.with(|slot| match slot.get() {
            Some(tid) => tid,
            None => {
                let tid = KernelTid(NEXT_HOST_TID.fetch_add(1, Ordering::Relaxed));
                slot.set(Some(tid));
                tid
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_tid_stable_per_thread() {
        let kernel = HostKernel;
        let mine = kernel.gettid();
        assert_eq!(kernel.gettid(), mine);

        let other = std::thread::spawn(move || kernel.gettid()).join().unwrap();
        assert_ne!(other, mine);
    }

    #[test]
    fn test_shared_kernel_handles() {
        let kernel = Arc::new(HostKernel);
        assert_eq!(kernel.gettid(), (&HostKernel).gettid());
    }
}
