//! Generic containers used to index thread records
//!
//! - [`LinkedList`]: ordered list with an injected match predicate
//! - [`Queue`] / [`MpQueue`]: FIFO queue, bare and mutex-wrapped
//! - [`HashTable`]: fixed bucket array of locked lists

mod node;

pub mod hash_table;
pub mod linked_list;
pub mod queue;

pub use hash_table::{HashTable, TableOps};
pub use linked_list::{ByEq, Finder, LinkedList};
pub use queue::{MpQueue, Queue};
