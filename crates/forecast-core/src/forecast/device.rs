//! Compute device selection
//!
//! Both devices evaluate a matrix row by row with the same kernel, so they
//! produce bit-identical results. The parallel device only spreads rows
//! across a rayon pool sized to its thread count.

use crate::error::ForecastError;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::{debug, warn};

/// One pool per thread count, built on first use and kept for the process
fn pool_for(threads: usize) -> Option<Arc<ThreadPool>> {
    static POOLS: OnceLock<Mutex<HashMap<usize, Arc<ThreadPool>>>> = OnceLock::new();

    let mut pools = POOLS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if let Some(pool) = pools.get(&threads) {
        return Some(Arc::clone(pool));
    }

    match ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("forecast-device-{i}"))
        .build()
    {
        Ok(pool) => {
            debug!(threads, "Built device thread pool");
            let pool = Arc::new(pool);
            pools.insert(threads, Arc::clone(&pool));
            Some(pool)
        }
        Err(e) => {
            warn!(threads, error = %e, "Failed to build device pool, using the global pool");
            None
        }
    }
}

/// Requested device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Parallel when more than one hardware thread is available
    #[default]
    Auto,
    /// Always single-threaded
    Cpu,
}

impl FromStr for DevicePreference {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            other => Err(ForecastError::InvalidInput(format!(
                "unknown device '{other}' (expected auto or cpu)"
            ))),
        }
    }
}

/// Resolved device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Parallel { threads: usize },
}

impl Device {
    /// Pure selection from a preference and the available parallelism
    pub fn select(preference: DevicePreference, available_threads: usize) -> Self {
        match preference {
            DevicePreference::Auto if available_threads > 1 => Self::Parallel {
                threads: available_threads,
            },
            _ => Self::Cpu,
        }
    }

    /// Select using the host's available parallelism
    pub fn detect(preference: DevicePreference) -> Self {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        Self::select(preference, threads)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Parallel { .. } => "parallel",
        }
    }

    /// Evaluate `f` for each row index and collect the rows in order
    pub(crate) fn map_rows<F>(&self, rows: usize, f: F) -> Vec<Vec<f64>>
    where
        F: Fn(usize) -> Vec<f64> + Send + Sync,
    {
        match self {
            Self::Cpu => (0..rows).map(f).collect(),
            Self::Parallel { threads } => match pool_for(*threads) {
                Some(pool) => pool.install(|| (0..rows).into_par_iter().map(f).collect()),
                None => (0..rows).into_par_iter().map(f).collect(),
            },
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cpu => write!(f, "cpu"),
            Self::Parallel { threads } => write!(f, "parallel({threads})"),
        }
    }
}
