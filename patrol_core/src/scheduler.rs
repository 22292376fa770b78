//! Polling interval derived from the sweep geometry.
use std::time::Duration;

/// Milliseconds of sleep per second the head needs to traverse the arc.
const BASE_MS_PER_SEC: f64 = 100.0;

/// Clamps the per-tick sleep to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalScheduler {
    min: Duration,
    max: Duration,
}

impl Default for IntervalScheduler {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(100),
            max: Duration::from_millis(1000),
        }
    }
}

impl IntervalScheduler {
    /// Bounds are swapped if given out of order.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Sleep before the next tick: `arc / speed * 100ms`, clamped.
    pub fn next_interval(&self, arc_width_deg: f64, scan_speed_dps: f64) -> Duration {
        if !scan_speed_dps.is_finite() || scan_speed_dps <= 0.0 {
            return self.max;
        }
        let raw_ms = arc_width_deg / scan_speed_dps * BASE_MS_PER_SEC;
        if !raw_ms.is_finite() {
            return self.max;
        }
        let min_ms = self.min.as_secs_f64() * 1000.0;
        let max_ms = self.max.as_secs_f64() * 1000.0;
        let ms = raw_ms.clamp(min_ms, max_ms);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let us = (ms * 1000.0).round() as u64;
        Duration::from_micros(us)
    }
}

/// `next_interval` with the default 100..=1000 ms bounds.
pub fn next_interval(arc_width_deg: f64, scan_speed_dps: f64) -> Duration {
    IntervalScheduler::default().next_interval(arc_width_deg, scan_speed_dps)
}
