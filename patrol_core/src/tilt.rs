//! Tilt baseline capture and the corrective walk back to level.
use std::time::Duration;

use eyre::WrapErr;
use patrol_traits::{BodyActuator, Clock, InclinationSensor};

use crate::angle::heading_from_inclination;
use crate::error::{PatrolError, Result};
use crate::hw_error::{actuate, map_hw_error};

/// Inclination captured before a posture sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TiltBaseline {
    pub ax: f64,
    pub ay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TiltAssessment {
    Level,
    /// Divergence from the baseline and the heading that walks it out.
    Tilted { dx: f64, dy: f64, heading_deg: f64 },
}

/// Compare a live reading against `baseline`. Either axis diverging by more
/// than `tolerance` counts as tilted.
pub fn assess(baseline: TiltBaseline, live: (f64, f64), tolerance: f64) -> TiltAssessment {
    let dx = live.0 - baseline.ax;
    let dy = live.1 - baseline.ay;
    if dx.abs() > tolerance || dy.abs() > tolerance {
        TiltAssessment::Tilted {
            dx,
            dy,
            heading_deg: heading_from_inclination(dx, dy),
        }
    } else {
        TiltAssessment::Level
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltRecovery {
    tolerance: f64,
    settle: Duration,
    approach_speed: f64,
}

impl Default for TiltRecovery {
    fn default() -> Self {
        Self {
            tolerance: 1.5,
            settle: Duration::from_millis(5000),
            approach_speed: 0.2,
        }
    }
}

impl TiltRecovery {
    pub fn new(tolerance: f64, settle: Duration, approach_speed: f64) -> Self {
        Self {
            tolerance,
            settle,
            approach_speed,
        }
    }

    /// One start/read/stop cycle on the sensor. The sensor is stopped even
    /// when the read fails.
    pub fn read_once<I>(sensor: &mut I) -> Result<(f64, f64)>
    where
        I: InclinationSensor + ?Sized,
    {
        sensor
            .start()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("start inclination sensor")?;
        let reading = sensor.read().map_err(|e| map_hw_error(&*e));
        if let Err(e) = sensor.stop() {
            tracing::warn!(error = %map_hw_error(&*e), "inclination sensor stop failed");
        }
        reading
            .map_err(eyre::Report::new)
            .wrap_err("read inclination")
    }

    pub fn capture_baseline<I>(&self, sensor: &mut I) -> Result<TiltBaseline>
    where
        I: InclinationSensor + ?Sized,
    {
        let (ax, ay) = Self::read_once(sensor)?;
        tracing::debug!(ax, ay, "tilt baseline captured");
        Ok(TiltBaseline { ax, ay })
    }

    /// Read the live inclination and compare it with `baseline`.
    pub fn check<I>(&self, sensor: &mut I, baseline: TiltBaseline) -> Result<TiltAssessment>
    where
        I: InclinationSensor + ?Sized,
    {
        let live = Self::read_once(sensor)?;
        let a = assess(baseline, live, self.tolerance);
        tracing::info!(
            dx = live.0 - baseline.ax,
            dy = live.1 - baseline.ay,
            level = matches!(a, TiltAssessment::Level),
            "tilt check"
        );
        Ok(a)
    }

    /// Walk toward `heading_deg` for the settle duration, then stop.
    pub fn correct<B>(&self, body: &mut B, clock: &dyn Clock, heading_deg: f64)
    where
        B: BodyActuator + ?Sized,
    {
        tracing::info!(heading_deg, "walking toward level ground");
        actuate(
            "walk_continuously",
            body.walk_continuously(heading_deg, self.approach_speed),
        );
        clock.sleep(self.settle);
        actuate("stop_walking", body.stop_walking());
    }
}

/// Error returned when no inclination sensor is fitted.
pub(crate) fn no_sensor() -> PatrolError {
    PatrolError::State("no inclination sensor".into())
}
