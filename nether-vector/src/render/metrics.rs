//! Render loop health monitoring and diagnostics

use std::time::{Duration, Instant};

use tracing::debug;

/// Metrics for render loop health monitoring
#[derive(Debug, Clone)]
pub(super) struct RenderMetrics {
    /// Cycles completed since last log
    pub cycles: u64,
    /// Cycles that found an empty front buffer
    pub empty_cycles: u64,
    /// Vertices streamed since last log
    pub vertices: u64,
    /// Samples written since last log
    pub samples: u64,
    /// Batcher flush count at last log
    pub flushes_at_last_log: u64,
    /// Average cycle time (microseconds)
    pub avg_cycle_time_us: f64,
    /// Longest cycle since last log (microseconds)
    pub max_cycle_time_us: u64,
    /// Timestamp of last metrics log
    pub last_log_time: Instant,
}

impl RenderMetrics {
    pub fn new() -> Self {
        Self {
            cycles: 0,
            empty_cycles: 0,
            vertices: 0,
            samples: 0,
            flushes_at_last_log: 0,
            avg_cycle_time_us: 0.0,
            max_cycle_time_us: 0,
            last_log_time: Instant::now(),
        }
    }

    /// Record one completed cycle
    pub fn record_cycle(&mut self, vertices: usize, samples: usize, elapsed: Duration) {
        let elapsed_us = elapsed.as_micros() as u64;
        self.cycles += 1;
        if vertices == 0 {
            self.empty_cycles += 1;
        }
        self.vertices += vertices as u64;
        self.samples += samples as u64;
        self.avg_cycle_time_us = 0.1 * elapsed_us as f64 + 0.9 * self.avg_cycle_time_us;
        self.max_cycle_time_us = self.max_cycle_time_us.max(elapsed_us);
    }

    /// Log metrics if enough time has passed (every 1 second)
    pub fn maybe_log(&mut self, total_flushes: u64) {
        if self.last_log_time.elapsed().as_secs() < 1 {
            return;
        }

        let flushes = total_flushes.saturating_sub(self.flushes_at_last_log);
        debug!(
            "RENDER METRICS [tid={:?}]: cycles={} (empty={}), vertices={}, samples={}, \
             flushes={}, avg_cycle={:.1}μs, max_cycle={}μs",
            std::thread::current().id(),
            self.cycles,
            self.empty_cycles,
            self.vertices,
            self.samples,
            flushes,
            self.avg_cycle_time_us,
            self.max_cycle_time_us
        );

        // Reset counters for next interval (show per-second rates)
        self.cycles = 0;
        self.empty_cycles = 0;
        self.vertices = 0;
        self.samples = 0;
        self.max_cycle_time_us = 0;
        self.flushes_at_last_log = total_flushes;
        self.last_log_time = Instant::now();
    }
}
