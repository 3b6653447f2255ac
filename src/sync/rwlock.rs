//! Writer-Priority Read/Write Lock
//!
//! Built from one blocking mutex and two condition variables. The mutex
//! only guards the bookkeeping below; it is never held across a caller's
//! critical section. Exclusion between readers and writers comes from the
//! counters and the wait loops.
//!
//! Policy:
//! - A reader waits while any writer is active *or waiting*, so a queued
//!   writer blocks all newly arriving readers.
//! - A writer waits while any reader or writer is active.
//! - The last reader out signals one waiting writer.
//! - A departing writer signals one waiting writer if there is one,
//!   otherwise broadcasts to every waiting reader.
//!
//! Wakeups are always re-checked against the counters; a single wait is
//! never assumed to be enough.

use parking_lot::{Condvar, Mutex};

// ============================================================================
// Lock State
// ============================================================================

/// Kind of access currently granted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Shared access
    Read,
    /// Exclusive access
    Write,
}

/// Counters and mode, guarded by the lock's mutex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct RwState {
    active_readers: u32,
    waiting_readers: u32,
    active_writers: u32,
    waiting_writers: u32,
    mode: Option<LockMode>,
}

impl RwState {
    const IDLE: Self = Self {
        active_readers: 0,
        waiting_readers: 0,
        active_writers: 0,
        waiting_writers: 0,
        mode: None,
    };

    /// A reader must wait while writers hold or want the lock
    fn reader_must_wait(&self) -> bool {
        self.active_writers > 0 || self.waiting_writers > 0
    }

    /// A writer must wait while anyone holds the lock
    fn writer_must_wait(&self) -> bool {
        self.active_readers > 0 || self.active_writers > 0
    }
}

/// Snapshot of a lock's counters, for inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RwLockStats {
    pub active_readers: u32,
    pub waiting_readers: u32,
    pub active_writers: u32,
    pub waiting_writers: u32,
    pub mode: Option<LockMode>,
}

impl From<&RwState> for RwLockStats {
    fn from(state: &RwState) -> Self {
        Self {
            active_readers: state.active_readers,
            waiting_readers: state.waiting_readers,
            active_writers: state.active_writers,
            waiting_writers: state.waiting_writers,
            mode: state.mode,
        }
    }
}

// ============================================================================
// Read/Write Lock
// ============================================================================

/// A read/write lock giving writers priority over new readers
#[derive(Debug)]
pub struct RwLock {
    /// Interlock for the counters
    state: Mutex<RwState>,
    /// Readers park here
    read_cvar: Condvar,
    /// Writers park here
    write_cvar: Condvar,
}

impl RwLock {
    /// Create a new unlocked read/write lock
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RwState::IDLE),
            read_cvar: Condvar::new(),
            write_cvar: Condvar::new(),
        }
    }

    /// Acquire for reading, blocking while writers are active or waiting
    pub fn start_read(&self) {
        let mut state = self.state.lock();

        state.waiting_readers += 1;
        while state.reader_must_wait() {
            self.read_cvar.wait(&mut state);
        }

        state.waiting_readers -= 1;
        state.active_readers += 1;
        state.mode = Some(LockMode::Read);
    }

    /// Acquire for writing, blocking while anyone holds the lock
    pub fn start_write(&self) {
        let mut state = self.state.lock();

        state.waiting_writers += 1;
        while state.writer_must_wait() {
            self.write_cvar.wait(&mut state);
        }

        state.waiting_writers -= 1;
        state.active_writers += 1;
        state.mode = Some(LockMode::Write);
    }

    /// Release a read hold
    ///
    /// Panics if no reader is active.
    pub fn stop_read(&self) {
        let mut state = self.state.lock();
        self.release_read(&mut state);
    }

    /// Release the write hold
    ///
    /// Panics unless exactly one writer is active.
    pub fn stop_write(&self) {
        let mut state = self.state.lock();
        self.release_write(&mut state);
    }

    /// Acquire in the given mode
    pub fn lock(&self, mode: LockMode) {
        match mode {
            LockMode::Read => self.start_read(),
            LockMode::Write => self.start_write(),
        }
    }

    /// Release whatever mode the lock is currently held in
    ///
    /// Panics if the lock is not held.
    pub fn unlock(&self) {
        let mut state = self.state.lock();
        match state.mode {
            Some(LockMode::Read) => self.release_read(&mut state),
            Some(LockMode::Write) => self.release_write(&mut state),
            None => panic!("rwlock: unlock of a lock that is not held"),
        }
    }

    /// Acquire for reading only if that would not block
    pub fn try_read(&self) -> bool {
        let mut state = self.state.lock();
        if state.reader_must_wait() {
            return false;
        }
        state.active_readers += 1;
        state.mode = Some(LockMode::Read);
        true
    }

    /// Acquire for writing only if that would not block
    pub fn try_write(&self) -> bool {
        let mut state = self.state.lock();
        if state.writer_must_wait() {
            return false;
        }
        state.active_writers += 1;
        state.mode = Some(LockMode::Write);
        true
    }

    /// Turn the caller's write hold into a read hold
    ///
    /// Other readers are let in too unless a writer is waiting.
    /// Panics unless the lock is write-held.
    pub fn downgrade(&self) {
        let mut state = self.state.lock();
        assert!(
            state.active_writers == 1 && state.mode == Some(LockMode::Write),
            "rwlock: downgrade without holding the write lock"
        );

        state.active_writers = 0;
        state.active_readers = 1;
        state.mode = Some(LockMode::Read);

        if state.waiting_writers == 0 {
            self.read_cvar.notify_all();
        }
    }

    /// Acquire for reading, released when the guard drops
    pub fn read(&self) -> ReadGuard<'_> {
        self.start_read();
        ReadGuard { lock: self }
    }

    /// Acquire for writing, released when the guard drops
    pub fn write(&self) -> WriteGuard<'_> {
        self.start_write();
        WriteGuard { lock: self }
    }

    /// Current counters and mode
    pub fn stats(&self) -> RwLockStats {
        RwLockStats::from(&*self.state.lock())
    }

    fn release_read(&self, state: &mut RwState) {
        assert!(
            state.active_readers > 0,
            "rwlock: read unlock without an active reader"
        );
        state.active_readers -= 1;

        if state.active_readers == 0 {
            state.mode = None;
            if state.waiting_writers > 0 {
                self.write_cvar.notify_one();
            }
        }
    }

    fn release_write(&self, state: &mut RwState) {
        assert_eq!(
            state.active_writers, 1,
            "rwlock: write unlock without exactly one active writer"
        );
        state.active_writers = 0;
        state.mode = None;

        if state.waiting_writers > 0 {
            self.write_cvar.notify_one();
        } else {
            self.read_cvar.notify_all();
        }
    }
}

impl Default for RwLock {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Lock Guard Types
// ============================================================================

/// RAII guard for a read hold
#[derive(Debug)]
pub struct ReadGuard<'a> {
    lock: &'a RwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.stop_read();
    }
}

/// RAII guard for the write hold
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a RwLock,
}

impl<'a> WriteGuard<'a> {
    /// Keep holding the lock, but shared
    pub fn downgrade(self) -> ReadGuard<'a> {
        let lock = self.lock;
        core::mem::forget(self);
        lock.downgrade();
        ReadGuard { lock }
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.stop_write();
    }
}
