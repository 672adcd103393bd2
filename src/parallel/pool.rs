//! Rayon thread pool for running independent CDO jobs of one stage.
//!
//! One worker (the default) keeps the pipeline fully sequential on the calling
//! thread. Use [WorkerPool::map] to fan a job list out over `workers` threads.

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::{Error, Result};

/// How many jobs of a stage may run at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    /// Number of worker threads. 0 and 1 both mean sequential.
    pub workers: usize,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self { workers: 1 }
    }
}

impl WorkerPool {
    pub fn sequential() -> Self {
        Self::default()
    }

    /// Use exactly `n` worker threads.
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    pub fn is_sequential(&self) -> bool {
        self.workers <= 1
    }

    /// Apply `f` to every item, preserving input order in the output.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Result<Vec<R>>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        if self.is_sequential() {
            return Ok(items.iter().map(f).collect());
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|err| Error::Config(format!("cannot start {} workers: {err}", self.workers)))?;
        Ok(pool.install(|| items.par_iter().map(f).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_sequential() {
        assert!(WorkerPool::default().is_sequential());
        assert!(WorkerPool::with_workers(0).is_sequential());
        assert!(!WorkerPool::with_workers(4).is_sequential());
    }

    #[test]
    fn parallel_map_keeps_order() {
        let items: Vec<u32> = (0..64).collect();
        let doubled = WorkerPool::with_workers(4).map(&items, |x| x * 2).unwrap();
        assert_eq!(doubled, items.iter().map(|x| x * 2).collect::<Vec<_>>());
    }
}
