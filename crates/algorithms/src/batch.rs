//! Independent runs over many inputs
//!
//! Runs share nothing, so a batch maps [`river_width`] over its inputs with
//! the chosen [`ProcessingMode`]. A failing run does not stop the others;
//! each input gets its own `Result`.

use rivwidth_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::pipeline::{river_width, RiverInputs, RiverWidthOutput, RiverWidthParams};

/// How runs are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessingMode {
    /// One run at a time on the calling thread
    Sequential,
    /// On the global thread pool
    #[default]
    Parallel,
    /// On a dedicated pool with at most this many concurrent runs
    ParallelWith(usize),
}

impl ProcessingMode {
    pub fn validate(&self) -> Result<()> {
        if let ProcessingMode::ParallelWith(0) = self {
            return Err(Error::invalid_parameter(
                "threads",
                0,
                "concurrency cap must be at least one",
            ));
        }
        Ok(())
    }

    /// Map `f` over `items`, keeping input order
    pub fn map<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        self.validate()?;
        match *self {
            ProcessingMode::Sequential => Ok(items.iter().map(f).collect()),
            #[cfg(feature = "parallel")]
            ProcessingMode::Parallel => Ok(items.par_iter().map(f).collect()),
            #[cfg(feature = "parallel")]
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::Other(format!("thread pool: {e}")))?;
                Ok(pool.install(|| items.par_iter().map(f).collect()))
            }
            #[cfg(not(feature = "parallel"))]
            ProcessingMode::Parallel | ProcessingMode::ParallelWith(_) => {
                Ok(items.iter().map(f).collect())
            }
        }
    }
}

/// Run the pipeline on every input.
///
/// Parameters and mode are checked once up front; after that every run
/// reports its own outcome, in input order.
pub fn run_batch(
    inputs: &[RiverInputs],
    params: &RiverWidthParams,
    mode: ProcessingMode,
) -> Result<Vec<Result<RiverWidthOutput>>> {
    params.validate()?;
    let results = mode.map(inputs, |input| river_width(input, params))?;

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(runs = results.len(), failed, ?mode, "batch finished");
    Ok(results)
}
