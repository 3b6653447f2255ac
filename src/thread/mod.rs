//! Thread records and the process-wide thread library context
//!
//! Kernel thread creation and stack memory are handled by the callers;
//! this layer tracks identity, kernel ids and lifecycle state.

pub mod kernel;
pub mod stack;
pub mod task;
pub mod tcb;

pub use kernel::{HostKernel, Kernel};
pub use stack::StackPool;
pub use task::{Task, TcbTable};
pub use tcb::{Tcb, TcbOps, ThreadState};
