//! Thread Control Records
//!
//! One record per live thread, filed in the task's TCB table under its
//! library id. The record carries two independent mutex/condvar pairs:
//!
//! - the **kernel id** pair. The kernel id starts unknown. Only the thread
//!   the record describes may resolve it: it queries the kernel once,
//!   writes the result under the mutex and broadcasts. Every other thread
//!   waits on the condvar until the value appears. The field is written at
//!   most once.
//! - the **state** pair. Lifecycle transitions (exit, join) are made under
//!   the state mutex and broadcast, so joiners can wait for them.
//!
//! Keeping the pairs separate means a thread waiting for a kernel id never
//! blocks behind a join, and vice versa.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use log::trace;
use parking_lot::{Condvar, Mutex};

use super::kernel::Kernel;
use crate::collections::{Finder, TableOps};
use crate::types::{ExitValue, KernelTid, StackBounds, ThreadId};

// ============================================================================
// Thread State
// ============================================================================

/// Lifecycle state of a library thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Created and not yet exited
    Running,
    /// Exited; exit value is available
    Exited,
    /// Exit value collected by a joiner; record is being torn down
    Joined,
}

impl ThreadState {
    /// Is `next` a legal successor of this state?
    pub fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Running, Self::Exited) | (Self::Exited, Self::Joined)
        )
    }
}

// ============================================================================
// Thread Control Record
// ============================================================================

/// Per-thread control record
pub struct Tcb {
    /// Library id (immutable)
    library_tid: ThreadId,

    /// Stack bounds (immutable)
    stack: StackBounds,

    /// Kernel id, `None` until resolved; written once
    kernel_tid: Mutex<Option<KernelTid>>,
    kernel_tid_cvar: Condvar,

    /// Lifecycle state
    state: Mutex<ThreadState>,
    state_cvar: Condvar,

    /// Exit value, written at most once when the thread exits
    exit_value: spin::Once<ExitValue>,

    /// Set by the first joiner
    join_claimed: AtomicBool,
}

impl Tcb {
    /// Create a running record whose kernel id is not yet known
    pub fn new(library_tid: ThreadId, stack: StackBounds) -> Self {
        Self {
            library_tid,
            stack,
            kernel_tid: Mutex::new(None),
            kernel_tid_cvar: Condvar::new(),
            state: Mutex::new(ThreadState::Running),
            state_cvar: Condvar::new(),
            exit_value: spin::Once::new(),
            join_claimed: AtomicBool::new(false),
        }
    }

    /// Create a running record with its kernel id already resolved
    pub fn with_kernel_tid(library_tid: ThreadId, stack: StackBounds, kernel_tid: KernelTid) -> Self {
        let tcb = Self::new(library_tid, stack);
        *tcb.kernel_tid.lock() = Some(kernel_tid);
        tcb
    }

    /// Library id of this thread
    pub fn library_tid(&self) -> ThreadId {
        self.library_tid
    }

    /// Stack bounds of this thread
    pub fn stack(&self) -> StackBounds {
        self.stack
    }

    // === Kernel id ===

    /// Kernel id if already resolved, without waiting
    pub fn kernel_tid(&self) -> Option<KernelTid> {
        *self.kernel_tid.lock()
    }

    /// Resolve this record's kernel id from the owning thread
    ///
    /// The first call queries `kernel`, stores the answer and wakes every
    /// waiter; later calls return the stored id without querying.
    ///
    /// Only the thread this record describes may call this. The record
    /// cannot tell who is calling, and a call from any other thread stores
    /// that thread's kernel id here permanently.
    pub fn resolve_kernel_tid<K: Kernel + ?Sized>(&self, kernel: &K) -> KernelTid {
        let mut slot = self.kernel_tid.lock();
        if let Some(tid) = *slot {
            return tid;
        }

        let tid = kernel.gettid();
        *slot = Some(tid);
        self.kernel_tid_cvar.notify_all();
        trace!("thread {} resolved kernel id {}", self.library_tid, tid);

        tid
    }

    /// Wait until the owning thread has resolved the kernel id
    pub fn wait_kernel_tid(&self) -> KernelTid {
        let mut slot = self.kernel_tid.lock();
        loop {
            if let Some(tid) = *slot {
                return tid;
            }
            trace!("waiting for kernel id of thread {}", self.library_tid);
            self.kernel_tid_cvar.wait(&mut slot);
        }
    }

    // === State ===

    /// Current lifecycle state
    pub fn state(&self) -> ThreadState {
        *self.state.lock()
    }

    /// Move to `next` and wake everyone waiting on the state
    ///
    /// Panics on an illegal transition.
    pub fn set_state(&self, next: ThreadState) {
        let mut state = self.state.lock();
        assert!(
            state.can_become(next),
            "thread {}: illegal state transition {:?} -> {:?}",
            self.library_tid,
            *state,
            next
        );
        *state = next;
        self.state_cvar.notify_all();
    }

    /// Block until `done` accepts the state, then return that state
    pub fn wait_for_state(&self, mut done: impl FnMut(ThreadState) -> bool) -> ThreadState {
        let mut state = self.state.lock();
        while !done(*state) {
            self.state_cvar.wait(&mut state);
        }
        *state
    }

    // === Exit value ===

    /// Record the value the thread exits with
    ///
    /// Panics if an exit value was already recorded.
    pub fn set_exit_value(&self, value: ExitValue) {
        let mut stored = false;
        self.exit_value.call_once(|| {
            stored = true;
            value
        });
        assert!(stored, "thread {}: exit value written twice", self.library_tid);
    }

    /// The exit value, once the thread has exited
    pub fn exit_value(&self) -> Option<ExitValue> {
        self.exit_value.get().copied()
    }

    /// Claim the right to join this thread; only the first claim succeeds
    pub fn claim_join(&self) -> bool {
        !self.join_claimed.swap(true, Ordering::AcqRel)
    }
}

impl fmt::Debug for Tcb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tcb")
            .field("library_tid", &self.library_tid)
            .field("kernel_tid", &self.kernel_tid())
            .field("state", &self.state())
            .field("stack", &self.stack)
            .finish()
    }
}

// ============================================================================
// TCB Table Operations
// ============================================================================

/// Files records under their library id; hash is the id itself
#[derive(Debug, Clone, Copy, Default)]
pub struct TcbOps;

impl Finder<Arc<Tcb>> for TcbOps {
    type Key = ThreadId;

    fn matches(&self, elem: &Arc<Tcb>, key: &ThreadId) -> bool {
        elem.library_tid == *key
    }
}

impl TableOps<Arc<Tcb>> for TcbOps {
    fn key_of<'a>(&self, elem: &'a Arc<Tcb>) -> &'a ThreadId {
        &elem.library_tid
    }

    fn hash(&self, key: &ThreadId) -> usize {
        key.0 as usize
    }
}
