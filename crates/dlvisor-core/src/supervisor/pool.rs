use std::thread;

/// Workers held back from the machine's parallelism.
const RESERVED: usize = 2;

/// Resolved worker count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSize {
    pub workers: usize,
    /// Set when a request above the limit was lowered.
    pub clamped_from: Option<usize>,
}

impl PoolSize {
    /// Default is `available - 2`, floor 1. Explicit requests are honoured up
    /// to that limit.
    pub fn resolve(requested: Option<usize>, available: usize) -> Self {
        let limit = available.saturating_sub(RESERVED).max(1);
        match requested {
            None => Self {
                workers: limit,
                clamped_from: None,
            },
            Some(n) if n > limit => Self {
                workers: limit,
                clamped_from: Some(n),
            },
            Some(n) => Self {
                workers: n.max(1),
                clamped_from: None,
            },
        }
    }

    /// Resolve against this machine.
    pub fn for_host(requested: Option<usize>) -> Self {
        let available = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::resolve(requested, available)
    }

    pub fn warning(&self) -> Option<String> {
        self.clamped_from.map(|requested| {
            format!(
                "Specified number of workers ({requested}) is too high, limiting to {}",
                self.workers
            )
        })
    }
}
