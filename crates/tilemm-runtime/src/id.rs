use core::sync::atomic::{AtomicU64, Ordering};

static HANDLE_COUNTER: AtomicU64 = AtomicU64::new(0);
static KERNEL_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifies a device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("buffer-{value}")]
pub struct HandleId {
    value: u64,
}

impl HandleId {
    /// Generate a new unique handle id.
    pub fn new() -> Self {
        Self {
            value: HANDLE_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a kernel object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
#[display("kernel-{value}")]
pub struct KernelId {
    value: u64,
}

impl KernelId {
    /// Generate a new unique kernel id.
    pub fn new() -> Self {
        Self {
            value: KERNEL_COUNTER.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl Default for KernelId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn ids_are_unique() {
        let first = HandleId::new();
        let second = HandleId::new();
        assert_ne!(first, second);

        let first = KernelId::new();
        let second = KernelId::new();
        assert_ne!(first, second);
    }
}
