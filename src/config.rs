//! # Bus configuration.
//!
//! Provides [`Config`], the settings consumed by
//! [`EventBusBuilder`](crate::EventBusBuilder) when it assembles an [`EventBus`](crate::EventBus)
//! and its built-in dispatch presets.
//!
//! ## Sentinel values
//! - `workers = 0` → derive the pool size from `load_factor` and the CPU count
//! - `load_factor <= 0` → treated as the default `0.5`
//!
//! Worker counts are clamped to [`MAX_WORKERS`].

use tokio::sync::Semaphore;

/// Default share of CPUs used for async dispatch workers.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Largest worker budget a pool can hold.
pub const MAX_WORKERS: usize = Semaphore::MAX_PERMITS;

/// Configuration for an event bus.
///
/// ## Field semantics
/// - `label`: Identifying label used in logs and `Display` (`EventBus[label]`)
/// - `workers`: Worker budget for async presets (`0` = derive from `load_factor`)
/// - `load_factor`: Share of available CPUs used when `workers = 0`
/// - `cache_hierarchy`: Memoize type-hierarchy expansion per runtime type
///
/// ## Notes
/// All fields are public. Prefer the accessors to avoid repeating sentinel checks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Label identifying the bus in logs.
    pub label: String,

    /// Number of workers for the async presets.
    ///
    /// - `0` = `max(1, cpus * load_factor)`
    /// - `n > 0` = exactly `n` handler invocations run concurrently per pool
    pub workers: usize,

    /// Share of available CPUs used when `workers = 0`.
    pub load_factor: f64,

    /// Whether the hierarchy resolver memoizes expansions.
    ///
    /// Disabling it recomputes the ancestor set on every post; routing is identical.
    pub cache_hierarchy: bool,
}

impl Config {
    /// Returns the effective worker count, in `1..=MAX_WORKERS`.
    #[inline]
    pub fn worker_count(&self) -> usize {
        if self.workers > 0 {
            return self.workers.min(MAX_WORKERS);
        }
        workers_by_load_factor(self.load_factor)
    }
}

/// Computes a worker count as a share of the available CPUs, in `1..=MAX_WORKERS`.
pub fn workers_by_load_factor(load_factor: f64) -> usize {
    let factor = if load_factor.is_finite() && load_factor > 0.0 {
        load_factor
    } else {
        DEFAULT_LOAD_FACTOR
    };
    let workers = (num_cpus::get() as f64 * factor) as usize;
    workers.clamp(1, MAX_WORKERS)
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `label = "EventBus"`
    /// - `workers = 0` (half of the CPUs, at least one)
    /// - `load_factor = 0.5`
    /// - `cache_hierarchy = true`
    fn default() -> Self {
        Self {
            label: "EventBus".to_string(),
            workers: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
            cache_hierarchy: true,
        }
    }
}
