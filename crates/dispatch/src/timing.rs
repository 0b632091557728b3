use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::DispatcherConfig;

/// Cumulative jitter counters since the timer was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TimingStats {
    pub intervals: u64,
    /// Sum of measured intervals.
    pub total_delta: Duration,
    /// Sum of absolute deviations from the target interval.
    pub total_variance: Duration,
    pub high_variance: u64,
    pub very_high_variance: u64,
}

impl TimingStats {
    pub fn average_variance(&self) -> Duration {
        if self.intervals == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_variance.as_nanos() / u128::from(self.intervals);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Measures the real interval between ticks against the target rate.
///
/// Purely observational: the scheduler never changes behaviour based on it.
#[derive(Debug)]
pub struct TickTimer {
    target: Duration,
    high: Duration,
    very_high: Duration,
    last: Instant,
    stats: TimingStats,
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
    report_every: u64,
    window_start: Instant,
}

impl TickTimer {
    pub fn new(
        target: Duration,
        high: Duration,
        very_high: Duration,
        capacity: usize,
        report_every: u64,
        start: Instant,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            target,
            high,
            very_high,
            last: start,
            stats: TimingStats::default(),
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
            report_every,
            window_start: start,
        }
    }

    pub fn from_config(config: &DispatcherConfig, start: Instant) -> Self {
        Self::new(
            config.interval(),
            millis(config.high_jitter_ms),
            millis(config.very_high_jitter_ms),
            config.timing_history,
            config.fps_report_interval,
            start,
        )
    }

    /// Record a tick at `now` and return the elapsed time since the previous one, in seconds.
    pub fn update(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last);
        self.last = now;

        let variance = delta.abs_diff(self.target);
        self.stats.intervals += 1;
        self.stats.total_delta += delta;
        self.stats.total_variance += variance;
        if variance > self.high {
            self.stats.high_variance += 1;
        }
        if variance > self.very_high {
            self.stats.very_high_variance += 1;
            tracing::trace!(?delta, ?variance, "very high tick jitter");
        }
        self.record(delta);

        if self.report_every > 0 && self.stats.intervals % self.report_every == 0 {
            let window = now.saturating_duration_since(self.window_start);
            if !window.is_zero() {
                let fps = self.report_every as f64 / window.as_secs_f64();
                tracing::debug!(
                    fps = format!("{fps:.1}"),
                    avg_variance = ?self.stats.average_variance(),
                    high = self.stats.high_variance,
                    very_high = self.stats.very_high_variance,
                    "tick rate"
                );
            }
            self.window_start = now;
        }

        delta.as_secs_f32()
    }

    fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn stats(&self) -> &TimingStats {
        &self.stats
    }

    fn window(&self) -> &[Duration] {
        let count = if self.filled { self.capacity } else { self.index };
        &self.history[..count]
    }

    pub fn average(&self) -> Duration {
        let window = self.window();
        if window.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = window.iter().sum();
        total / window.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.window().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.window().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.window().len()
    }
}

fn millis(ms: f32) -> Duration {
    Duration::try_from_secs_f32(ms / 1000.0).unwrap_or(Duration::ZERO)
}
