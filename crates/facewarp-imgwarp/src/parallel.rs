use rayon::prelude::*;
use thiserror::Error;

use crate::error::WarpError;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The band length must be valid.
    #[error("band length must be > 0, got {0}")]
    InvalidBandLength(usize),
}

/// Controls how the grid deformation and the resampling are executed.
///
/// All strategies produce bit-identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool, splitting the work by grid cells.
    #[default]
    ParallelCells,

    /// Run sequentially on the current thread.
    ///
    /// Useful for small images, debugging, or when the overhead of parallelization
    /// outweighs the benefits.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

/// Run `op` inside the thread pool selected by the strategy.
fn install<R, F>(strategy: ExecutionStrategy, op: F) -> Result<R, ParallelError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match strategy {
        ExecutionStrategy::Fixed(0) => Err(ParallelError::InvalidThreadCount(0)),
        ExecutionStrategy::Fixed(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;
            Ok(pool.install(op))
        }
        ExecutionStrategy::ParallelCells | ExecutionStrategy::Serial => Ok(op()),
    }
}

/// Apply a fallible function to every element of a slice, preserving order.
///
/// The first error found aborts the operation.
pub fn try_map<T, U, F>(strategy: ExecutionStrategy, items: &[T], f: F) -> Result<Vec<U>, WarpError>
where
    T: Sync,
    U: Send,
    F: Fn(&T) -> Result<U, WarpError> + Send + Sync,
{
    match strategy {
        ExecutionStrategy::Serial => items.iter().map(f).collect(),
        _ => install(strategy, || {
            items
                .par_iter()
                .map(f)
                .collect::<Result<Vec<U>, WarpError>>()
        })?,
    }
}

/// Apply a function to consecutive bands of a buffer in parallel.
///
/// The closure receives the band index and the mutable band. The last band
/// may be shorter than `band_len`.
pub fn par_iter_bands<T, F>(
    strategy: ExecutionStrategy,
    dst: &mut [T],
    band_len: usize,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if band_len == 0 {
        return Err(ParallelError::InvalidBandLength(band_len));
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst.chunks_mut(band_len)
                .enumerate()
                .for_each(|(i, band)| f(i, band));
            Ok(())
        }
        _ => install(strategy, || {
            dst.par_chunks_mut(band_len)
                .enumerate()
                .for_each(|(i, band)| f(i, band));
        }),
    }
}
