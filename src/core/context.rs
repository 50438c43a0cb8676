//! Execution context scoped to one fitting run.
//!
//! Owns the rayon thread pool used for intra-iteration parallel work (the
//! Chamfer nearest-neighbour searches). Build it once per run and pass it by
//! reference; dropping it releases the worker threads.

use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct ExecutionContext {
    pool: ThreadPool,
}

impl ExecutionContext {
    /// Build a context with `threads` workers (0 = rayon's default).
    pub fn new(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("catheter-fit-{i}"))
            .build()?;
        tracing::debug!(threads = pool.current_num_threads(), "Execution context ready");
        Ok(Self { pool })
    }

    /// Single worker thread; results are identical to the parallel path.
    pub fn single_threaded() -> Result<Self> {
        Self::new(1)
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `op` inside the pool so nested `par_iter` calls use its workers.
    pub fn install<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("threads", &self.num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_install_runs_on_pool() {
        let ctx = ExecutionContext::new(2).unwrap();
        assert_eq!(ctx.num_threads(), 2);
        let sum: u64 = ctx.install(|| (0..1000u64).into_par_iter().sum());
        assert_eq!(sum, 499_500);
    }
}
