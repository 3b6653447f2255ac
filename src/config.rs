//! Library configuration
//!
//! Settings fixed at `Task::init` time.

use crate::error::{Result, ThreadError};
use crate::types::PAGE_SIZE;

/// Default number of buckets in the TCB table
pub const DEFAULT_TCB_BUCKETS: usize = 32;

/// Thread library configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Stack space given to every child thread, in bytes
    pub stack_size: usize,
    /// Number of buckets in the TCB table
    pub tcb_buckets: usize,
}

impl ThreadConfig {
    pub const fn new() -> Self {
        Self {
            stack_size: PAGE_SIZE,
            tcb_buckets: DEFAULT_TCB_BUCKETS,
        }
    }

    /// Set the per-thread stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Set the TCB table bucket count
    pub fn with_tcb_buckets(mut self, tcb_buckets: usize) -> Self {
        self.tcb_buckets = tcb_buckets;
        self
    }

    /// Check the settings and round the stack size up to whole pages
    pub fn validate(self) -> Result<Self> {
        if self.stack_size == 0 {
            return Err(ThreadError::InvalidArgument("stack size is zero"));
        }
        if self.tcb_buckets == 0 {
            return Err(ThreadError::InvalidArgument("bucket count is zero"));
        }

        let stack_size = self
            .stack_size
            .checked_next_multiple_of(PAGE_SIZE)
            .ok_or(ThreadError::InvalidArgument("stack size overflows"))?;

        Ok(Self { stack_size, ..self })
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ThreadConfig::default();
        assert_eq!(config.stack_size, PAGE_SIZE);
        assert_eq!(config.tcb_buckets, DEFAULT_TCB_BUCKETS);
        assert_eq!(config.validate(), Ok(config));
    }

    #[test]
    fn test_stack_size_rounded_to_page() {
        let config = ThreadConfig::new().with_stack_size(PAGE_SIZE + 1);
        assert_eq!(config.validate().unwrap().stack_size, 2 * PAGE_SIZE);

        let config = ThreadConfig::new().with_stack_size(3 * PAGE_SIZE);
        assert_eq!(config.validate().unwrap().stack_size, 3 * PAGE_SIZE);
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(matches!(
            ThreadConfig::new().with_stack_size(0).validate(),
            Err(ThreadError::InvalidArgument(_))
        ));
        assert!(matches!(
            ThreadConfig::new().with_tcb_buckets(0).validate(),
            Err(ThreadError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stack_size_overflow_rejected() {
        let config = ThreadConfig::new().with_stack_size(usize::MAX);
        assert!(config.validate().is_err());
    }
}
