//! Simulated rig used by the CLI without hardware and by integration tests.
//!
//! Every blocking actuation sleeps on the shared `Clock`, so with a
//! `ManualClock` a whole patrol session runs in virtual time.
use std::sync::Arc;
use std::time::{Duration, Instant};

use patrol_traits::{
    BodyActuator, Clock, HeadActuator, HwResult, InclinationSensor, LegPositions,
    RangeSensor, RotationDirection,
};
use tracing::{debug, info};

use crate::error::HwError;

type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Head that integrates continuous rotation against the clock.
pub struct SimHead {
    clock: SharedClock,
    bearing: f64,
    rotation: Option<(RotationDirection, f64, Instant)>,
}

impl SimHead {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            bearing: 0.0,
            rotation: None,
        }
    }

    pub fn is_rotating(&self) -> bool {
        self.rotation.is_some()
    }

    fn integrate(&mut self) {
        if let Some((dir, speed, since)) = self.rotation {
            let now = self.clock.now();
            let dt = now.saturating_duration_since(since).as_secs_f64();
            self.bearing = (self.bearing + dir.sign() * speed * dt).rem_euclid(360.0);
            self.rotation = Some((dir, speed, now));
        }
    }
}

impl HeadActuator for SimHead {
    fn move_head_to(&mut self, bearing_deg: f64, duration: Duration) -> HwResult<()> {
        self.integrate();
        self.rotation = None;
        self.clock.sleep(duration);
        self.bearing = bearing_deg.rem_euclid(360.0);
        debug!(bearing_deg = self.bearing, "sim head moved");
        Ok(())
    }

    fn rotate_continuously(
        &mut self,
        direction: RotationDirection,
        speed_dps: f64,
    ) -> HwResult<()> {
        self.integrate();
        self.rotation = Some((direction, speed_dps, self.clock.now()));
        Ok(())
    }

    fn stop_rotating(&mut self) -> HwResult<()> {
        self.integrate();
        self.rotation = None;
        Ok(())
    }

    fn current_bearing(&mut self) -> HwResult<f64> {
        self.integrate();
        Ok(self.bearing)
    }

    fn relax_head(&mut self) -> HwResult<()> {
        self.integrate();
        self.rotation = None;
        debug!("sim head relaxed");
        Ok(())
    }
}

/// Reach envelope of a simulated leg; targets outside are fitted.
const LEG_A_RANGE: (f64, f64) = (-90.0, 90.0);
const LEG_R_RANGE: (f64, f64) = (0.0, 250.0);
const LEG_H_RANGE: (f64, f64) = (-150.0, 150.0);

/// Body that tracks walking state and counts leg moves.
pub struct SimBody {
    clock: SharedClock,
    walking: Option<(f64, f64)>,
    leg_moves: usize,
}

impl SimBody {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            walking: None,
            leg_moves: 0,
        }
    }

    /// Current `(heading_deg, speed)` while walking.
    pub fn walking(&self) -> Option<(f64, f64)> {
        self.walking
    }

    pub fn leg_moves(&self) -> usize {
        self.leg_moves
    }
}

impl BodyActuator for SimBody {
    fn stand_up(&mut self) -> HwResult<()> {
        debug!("sim body standing");
        Ok(())
    }

    fn relax_legs(&mut self) -> HwResult<()> {
        self.walking = None;
        debug!("sim body legs relaxed");
        Ok(())
    }

    fn walk_continuously(&mut self, heading_deg: f64, speed: f64) -> HwResult<()> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Box::new(HwError::Unreachable(format!(
                "walk speed {speed}"
            ))));
        }
        self.walking = Some((heading_deg.rem_euclid(360.0), speed));
        debug!(heading_deg, speed, "sim body walking");
        Ok(())
    }

    fn stop_walking(&mut self) -> HwResult<()> {
        self.walking = None;
        Ok(())
    }

    fn set_leg_positions(
        &mut self,
        positions: &LegPositions,
        duration: Duration,
    ) -> HwResult<()> {
        let mut fitted = LegPositions::new();
        for (leg, mut p) in positions.iter() {
            let reachable = (LEG_A_RANGE.0..=LEG_A_RANGE.1).contains(&p.a)
                && (LEG_R_RANGE.0..=LEG_R_RANGE.1).contains(&p.r)
                && (LEG_H_RANGE.0..=LEG_H_RANGE.1).contains(&p.h);
            if !reachable {
                info!(leg, a = p.a, r = p.r, h = p.h, "leg target unreachable, fitting");
                p.a = p.a.clamp(LEG_A_RANGE.0, LEG_A_RANGE.1);
                p.r = p.r.clamp(LEG_R_RANGE.0, LEG_R_RANGE.1);
                p.h = p.h.clamp(LEG_H_RANGE.0, LEG_H_RANGE.1);
            }
            fitted.set(leg, p);
        }
        if fitted.iter().any(|(_, p)| !(p.a.is_finite() && p.r.is_finite() && p.h.is_finite())) {
            return Err(Box::new(HwError::Unreachable("non-finite leg target".into())));
        }
        self.clock.sleep(duration);
        self.leg_moves += 1;
        Ok(())
    }
}

/// Range sensor replaying a list of readings in a loop.
pub struct SimRange {
    readings: Vec<f64>,
    idx: usize,
}

impl SimRange {
    /// Nothing in range.
    pub const CLEAR_MM: f64 = 1500.0;

    pub fn constant(mm: f64) -> Self {
        Self::scripted(vec![mm])
    }

    pub fn scripted(readings: Vec<f64>) -> Self {
        let readings = if readings.is_empty() {
            vec![Self::CLEAR_MM]
        } else {
            readings
        };
        Self { readings, idx: 0 }
    }

    /// Build from a comma-separated list such as `"900,900,120"`.
    /// Unparseable entries are skipped.
    pub fn from_list(s: &str) -> Self {
        Self::scripted(parse_list(s))
    }
}

impl RangeSensor for SimRange {
    fn distance_mm(&mut self) -> HwResult<f64> {
        let v = self.readings[self.idx % self.readings.len()];
        self.idx = self.idx.wrapping_add(1);
        Ok(v)
    }
}

/// Inclination sensor returning a fixed sequence; the last value repeats.
pub struct SimInclination {
    readings: Vec<(f64, f64)>,
    idx: usize,
    started: bool,
}

impl SimInclination {
    pub fn level() -> Self {
        Self::scripted(vec![(0.0, 0.0)])
    }

    pub fn scripted(readings: Vec<(f64, f64)>) -> Self {
        let readings = if readings.is_empty() {
            vec![(0.0, 0.0)]
        } else {
            readings
        };
        Self {
            readings,
            idx: 0,
            started: false,
        }
    }

    /// Level baseline followed by `"ax,ay"` for every later read.
    pub fn from_pair(s: &str) -> Self {
        match parse_list(s).as_slice() {
            [ax, ay, ..] => Self::scripted(vec![(0.0, 0.0), (*ax, *ay)]),
            _ => Self::level(),
        }
    }
}

impl InclinationSensor for SimInclination {
    fn start(&mut self) -> HwResult<()> {
        self.started = true;
        Ok(())
    }

    fn read(&mut self) -> HwResult<(f64, f64)> {
        if !self.started {
            return Err(Box::new(HwError::Gpio(
                "inclination sensor not started".into(),
            )));
        }
        let i = self.idx.min(self.readings.len() - 1);
        self.idx = self.idx.saturating_add(1);
        Ok(self.readings[i])
    }

    fn stop(&mut self) -> HwResult<()> {
        self.started = false;
        Ok(())
    }
}

fn parse_list(s: &str) -> Vec<f64> {
    s.split(',')
        .filter_map(|t| t.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use patrol_traits::{LegPosition, ManualClock};

    fn clock() -> (ManualClock, SharedClock) {
        let c = ManualClock::new();
        (c.clone(), Arc::new(c))
    }

    #[test]
    fn head_integrates_rotation_over_virtual_time() {
        let (manual, shared) = clock();
        let mut head = SimHead::new(shared);
        head.rotate_continuously(RotationDirection::Clockwise, 20.0)
            .unwrap();
        manual.advance(Duration::from_millis(500));
        assert!((head.current_bearing().unwrap() - 10.0).abs() < 1e-9);

        head.rotate_continuously(RotationDirection::CounterClockwise, 20.0)
            .unwrap();
        manual.advance(Duration::from_secs(1));
        // 10 - 20 wraps to 350
        assert!((head.current_bearing().unwrap() - 350.0).abs() < 1e-9);
    }

    #[test]
    fn head_move_is_blocking_and_stops_rotation() {
        let (manual, shared) = clock();
        let mut head = SimHead::new(shared);
        head.rotate_continuously(RotationDirection::Clockwise, 20.0)
            .unwrap();
        head.move_head_to(90.0, Duration::from_millis(2000)).unwrap();
        assert_eq!(manual.elapsed(), Duration::from_millis(2000));
        assert!(!head.is_rotating());
        assert_eq!(head.current_bearing().unwrap(), 90.0);
    }

    #[test]
    fn range_cycles_script() {
        let mut r = SimRange::from_list("900, x, 120");
        assert_eq!(r.distance_mm().unwrap(), 900.0);
        assert_eq!(r.distance_mm().unwrap(), 120.0);
        assert_eq!(r.distance_mm().unwrap(), 900.0);
    }

    #[test]
    fn inclination_requires_start() {
        let mut s = SimInclination::from_pair("2.0,0.5");
        assert!(s.read().is_err());
        s.start().unwrap();
        assert_eq!(s.read().unwrap(), (0.0, 0.0));
        assert_eq!(s.read().unwrap(), (2.0, 0.5));
        assert_eq!(s.read().unwrap(), (2.0, 0.5));
    }

    #[test]
    fn body_fits_unreachable_legs() {
        let (_, shared) = clock();
        let mut body = SimBody::new(shared);
        let mut lp = LegPositions::new();
        lp.set(0, LegPosition::new(120.0, 170.0, -20.0));
        body.set_leg_positions(&lp, Duration::from_millis(400))
            .unwrap();
        assert_eq!(body.leg_moves(), 1);
    }
}
