//! Pool statistics

use std::collections::VecDeque;

/// Number of per-tick samples kept by default
const DEFAULT_MAX_SAMPLES: usize = 120;

/// Counters of the pool registry's activity
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Objects constructed in recent ticks, oldest first
    spawn_history: VecDeque<usize>,
    /// Maximum samples to keep
    max_samples: usize,
    /// Ticks processed so far
    ticks: u64,
    /// Objects constructed, queued or critical
    spawned_total: u64,
    /// Queued requests cancelled before construction
    cancelled_total: u64,
    /// Objects destroyed by pool clearing
    destroyed_total: u64,
    /// Acquisitions served from free objects
    reused_total: u64,
}

impl PoolStats {
    /// Create an empty stats tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            spawn_history: VecDeque::with_capacity(DEFAULT_MAX_SAMPLES),
            max_samples: DEFAULT_MAX_SAMPLES,
            ticks: 0,
            spawned_total: 0,
            cancelled_total: 0,
            destroyed_total: 0,
            reused_total: 0,
        }
    }

    /// Record a finished tick and how many queued objects it constructed
    pub fn record_tick(&mut self, spawned: usize) {
        self.ticks += 1;

        if self.spawn_history.len() >= self.max_samples {
            self.spawn_history.pop_front();
        }
        self.spawn_history.push_back(spawned);
    }

    pub(crate) fn record_spawn(&mut self) {
        self.spawned_total += 1;
    }

    pub(crate) fn record_cancel(&mut self) {
        self.cancelled_total += 1;
    }

    pub(crate) fn record_destroyed(&mut self, count: usize) {
        self.destroyed_total += count as u64;
    }

    pub(crate) fn record_reuse(&mut self) {
        self.reused_total += 1;
    }

    /// Ticks processed so far
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Objects constructed so far
    #[must_use]
    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    /// Spawn requests cancelled so far
    #[must_use]
    pub fn cancelled_total(&self) -> u64 {
        self.cancelled_total
    }

    /// Objects destroyed so far
    #[must_use]
    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }

    /// Acquisitions served without construction
    #[must_use]
    pub fn reused_total(&self) -> u64 {
        self.reused_total
    }

    /// Objects constructed by the most recent tick
    #[must_use]
    pub fn last_tick_spawned(&self) -> usize {
        self.spawn_history.back().copied().unwrap_or(0)
    }

    /// Largest number of objects constructed in a single recent tick
    #[must_use]
    pub fn peak_tick_spawned(&self) -> usize {
        self.spawn_history.iter().copied().max().unwrap_or(0)
    }

    /// Average constructions per tick over the recent history
    #[must_use]
    pub fn avg_tick_spawned(&self) -> f32 {
        if self.spawn_history.is_empty() {
            return 0.0;
        }
        let total: usize = self.spawn_history.iter().sum();
        total as f32 / self.spawn_history.len() as f32
    }

    /// Get a formatted stats string
    #[must_use]
    pub fn format_stats(&self) -> String {
        format!(
            "Ticks: {} | Spawned: {} (peak {}/tick, avg {:.2}) | Reused: {} | Cancelled: {} | Destroyed: {}",
            self.ticks,
            self.spawned_total,
            self.peak_tick_spawned(),
            self.avg_tick_spawned(),
            self.reused_total,
            self.cancelled_total,
            self.destroyed_total
        )
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new()
    }
}
