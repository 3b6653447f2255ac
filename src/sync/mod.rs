//! Synchronization primitives layered on blocking mutexes and condvars

pub mod rwlock;

pub use rwlock::{LockMode, ReadGuard, RwLock, RwLockStats, WriteGuard};
