//! Task - Process-wide thread library state
//!
//! One `Task` exists per process. It owns the table of every live
//! [`Tcb`], the pool of child stack blocks and the library id counter,
//! and is passed by reference to every operation instead of living in a
//! global.
//!
//! Lifecycle: [`Task::init`] once, before any other thread is registered;
//! [`Task::shutdown`] once, consuming the context.

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};
use log::debug;

use super::kernel::{HostKernel, Kernel};
use super::stack::StackPool;
use super::tcb::{Tcb, TcbOps, ThreadState};
use crate::collections::HashTable;
use crate::config::ThreadConfig;
use crate::error::{Result, ThreadError};
use crate::types::{ExitValue, KernelTid, StackBounds, ThreadId, PAGE_SIZE};

/// Table of live thread records, keyed by library id
pub type TcbTable = HashTable<Arc<Tcb>, TcbOps>;

/// Thread library context
#[derive(Debug)]
pub struct Task<K: Kernel = HostKernel> {
    /// Validated configuration
    config: ThreadConfig,
    /// Kernel services
    kernel: K,
    /// Every live record
    tcbs: TcbTable,
    /// Child stack blocks
    stacks: StackPool,
    /// Next library id to hand out
    next_tid: AtomicU32,
    /// Record of the thread that called `init`
    root: Arc<Tcb>,
}

impl<K: Kernel> Task<K> {
    /// Initialize the thread library from the calling (root) thread
    ///
    /// `root_stack` is the caller's own stack; child stacks are carved
    /// below it. The root record gets library id 0 and its kernel id is
    /// resolved right away.
    pub fn init(config: ThreadConfig, kernel: K, root_stack: StackBounds) -> Result<Self> {
        let config = config.validate()?;

        let highest_child = root_stack
            .low
            .checked_sub(PAGE_SIZE)
            .ok_or(ThreadError::InvalidArgument("no room below the root stack"))?;

        let tcbs = HashTable::init(config.tcb_buckets, TcbOps)?;
        let root = Arc::new(Tcb::with_kernel_tid(
            ThreadId::ROOT,
            root_stack,
            kernel.gettid(),
        ));
        tcbs.insert(Arc::clone(&root));

        debug!(
            "thread library initialized: stack size {:#x}, {} tcb buckets, root kernel id {:?}",
            config.stack_size,
            config.tcb_buckets,
            root.kernel_tid()
        );

        Ok(Self {
            config,
            kernel,
            tcbs,
            stacks: StackPool::new(highest_child, config.stack_size),
            next_tid: AtomicU32::new(ThreadId::ROOT.0 + 1),
            root,
        })
    }

    /// Validated configuration
    pub fn config(&self) -> &ThreadConfig {
        &self.config
    }

    /// Record of the root thread
    pub fn root(&self) -> &Arc<Tcb> {
        &self.root
    }

    /// Record table
    pub fn tcbs(&self) -> &TcbTable {
        &self.tcbs
    }

    /// Stack pool
    pub fn stacks(&self) -> &StackPool {
        &self.stacks
    }

    /// Number of live records, root included
    pub fn thread_count(&self) -> usize {
        self.tcbs.len()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Create and file the record for a new thread
    ///
    /// The record starts `Running` with an unknown kernel id; the new
    /// thread resolves it itself with [`Task::my_kernel_tid`].
    pub fn register_thread(&self) -> Result<Arc<Tcb>> {
        let stack = self.stacks.acquire()?;

        let tid = match self
            .next_tid
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |id| id.checked_add(1))
        {
            Ok(id) => ThreadId(id),
            Err(_) => {
                self.stacks.release(stack);
                return Err(ThreadError::IdsExhausted);
            }
        };

        let tcb = Arc::new(Tcb::new(tid, stack));
        self.tcbs.insert(Arc::clone(&tcb));
        debug!("registered thread {} on stack {:#x}..{:#x}", tid, stack.low, stack.high);

        Ok(tcb)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Record for library id `tid`
    pub fn lookup(&self, tid: ThreadId) -> Option<Arc<Tcb>> {
        self.tcbs.lookup(&tid)
    }

    /// Record whose stack contains `addr`
    pub fn tcb_containing(&self, addr: usize) -> Option<Arc<Tcb>> {
        self.tcbs.find(|tcb| tcb.stack().contains(addr))
    }

    /// Kernel id of thread `tid`, waiting until that thread resolves it
    ///
    /// Panics if `tid` is not a live thread.
    pub fn kernel_tid_of(&self, tid: ThreadId) -> KernelTid {
        match self.lookup(tid) {
            Some(tcb) => tcb.wait_kernel_tid(),
            None => panic!("kernel_tid_of: no thread with library id {}", tid),
        }
    }

    /// Kernel id of the calling thread, given its own record
    ///
    /// `me` must be the caller's own record: the first call stores the
    /// caller's kernel id in it for good. Use [`Task::current_kernel_tid`]
    /// when the caller only knows where its stack is.
    pub fn my_kernel_tid(&self, me: &Tcb) -> KernelTid {
        me.resolve_kernel_tid(&self.kernel)
    }

    /// Kernel id of the calling thread, found through an address on its stack
    ///
    /// `stack_addr` is any address inside the caller's stack, such as that
    /// of a local. Returns `None` when no record owns that address.
    pub fn current_kernel_tid(&self, stack_addr: usize) -> Option<KernelTid> {
        let me = self.tcb_containing(stack_addr)?;
        Some(me.resolve_kernel_tid(&self.kernel))
    }

    // ========================================================================
    // Exit and Join
    // ========================================================================

    /// Record `value` as `me`'s exit value and mark it exited
    pub fn exit(&self, me: &Tcb, value: ExitValue) {
        me.set_exit_value(value);
        me.set_state(ThreadState::Exited);
        debug!("thread {} exited with {:#x}", me.library_tid(), value);
    }

    /// Wait for thread `tid` to exit, tear down its record, return its value
    pub fn join(&self, tid: ThreadId) -> Result<ExitValue> {
        if tid.is_root() {
            return Err(ThreadError::InvalidArgument("the root thread cannot be joined"));
        }

        let tcb = self.lookup(tid).ok_or(ThreadError::NoSuchThread(tid))?;
        if !tcb.claim_join() {
            return Err(ThreadError::AlreadyJoined(tid));
        }

        tcb.wait_for_state(|state| state == ThreadState::Exited);
        tcb.set_state(ThreadState::Joined);

        let value = match tcb.exit_value() {
            Some(value) => value,
            None => panic!("thread {} exited without an exit value", tid),
        };

        self.tcbs.remove(&tid);
        self.stacks.release(tcb.stack());
        debug!("joined thread {}, exit value {:#x}", tid, value);

        Ok(value)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tear the library down, returning how many records were still live
    pub fn shutdown(self) -> usize {
        let remaining = self.tcbs.clear();
        debug!("thread library shut down with {} live records", remaining);
        remaining
    }
}
