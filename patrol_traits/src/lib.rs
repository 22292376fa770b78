//! Hardware contracts consumed by the patrol controller.
//!
//! Errors cross this boundary as `Box<dyn Error + Send + Sync>` so drivers can
//! report whatever they like; `patrol_core` maps them to typed errors.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::time::Duration;

pub type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Number of legs on the chassis.
pub const LEG_COUNT: usize = 6;

/// Direction of continuous head rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationDirection {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl RotationDirection {
    /// +1 for clockwise, -1 for counter-clockwise.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Self::Clockwise => 1.0,
            Self::CounterClockwise => -1.0,
        }
    }

    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

/// Toe position of one leg.
///
/// `a` is the leg angle in degrees (-90..=90), `r` the radial reach in mm and
/// `h` the toe height in mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPosition {
    pub a: f64,
    pub r: f64,
    pub h: f64,
}

impl LegPosition {
    pub const fn new(a: f64, r: f64, h: f64) -> Self {
        Self { a, r, h }
    }
}

/// Target toe positions for the six legs. Unset legs keep their current pose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegPositions {
    legs: [Option<LegPosition>; LEG_COUNT],
}

impl LegPositions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target for leg `index`; out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, pos: LegPosition) -> &mut Self {
        if let Some(slot) = self.legs.get_mut(index) {
            *slot = Some(pos);
        }
        self
    }

    pub fn get(&self, index: usize) -> Option<LegPosition> {
        self.legs.get(index).copied().flatten()
    }

    /// Iterate `(leg_index, position)` over legs that have a target.
    pub fn iter(&self) -> impl Iterator<Item = (usize, LegPosition)> + '_ {
        self.legs
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p)))
    }

    pub fn is_empty(&self) -> bool {
        self.legs.iter().all(Option::is_none)
    }
}

/// Sensor head on top of the body.
pub trait HeadActuator {
    /// Blocking absolute move to `bearing_deg`, taking `duration`.
    fn move_head_to(&mut self, bearing_deg: f64, duration: Duration) -> HwResult<()>;
    fn rotate_continuously(&mut self, direction: RotationDirection, speed_dps: f64)
    -> HwResult<()>;
    fn stop_rotating(&mut self) -> HwResult<()>;
    /// Current head bearing in degrees.
    fn current_bearing(&mut self) -> HwResult<f64>;
    /// Release head servo torque.
    fn relax_head(&mut self) -> HwResult<()>;
}

/// Legs and walking.
pub trait BodyActuator {
    fn stand_up(&mut self) -> HwResult<()>;
    fn relax_legs(&mut self) -> HwResult<()>;
    fn walk_continuously(&mut self, heading_deg: f64, speed: f64) -> HwResult<()>;
    fn stop_walking(&mut self) -> HwResult<()>;
    /// Move legs to `positions` over `duration`. Drivers fit unreachable
    /// targets to the nearest reachable pose and report failure as an error.
    fn set_leg_positions(&mut self, positions: &LegPositions, duration: Duration)
    -> HwResult<()>;
}

/// Forward distance sensor. No freshness guarantee on the value.
pub trait RangeSensor {
    fn distance_mm(&mut self) -> HwResult<f64>;
}

/// Chassis inclination. `read` returns `(ax, ay)`: positive `ax` means the
/// front is raised, positive `ay` means the left side is raised.
pub trait InclinationSensor {
    fn start(&mut self) -> HwResult<()>;
    fn read(&mut self) -> HwResult<(f64, f64)>;
    fn stop(&mut self) -> HwResult<()>;
}

impl<T: HeadActuator + ?Sized> HeadActuator for Box<T> {
    fn move_head_to(&mut self, bearing_deg: f64, duration: Duration) -> HwResult<()> {
        (**self).move_head_to(bearing_deg, duration)
    }
    fn rotate_continuously(
        &mut self,
        direction: RotationDirection,
        speed_dps: f64,
    ) -> HwResult<()> {
        (**self).rotate_continuously(direction, speed_dps)
    }
    fn stop_rotating(&mut self) -> HwResult<()> {
        (**self).stop_rotating()
    }
    fn current_bearing(&mut self) -> HwResult<f64> {
        (**self).current_bearing()
    }
    fn relax_head(&mut self) -> HwResult<()> {
        (**self).relax_head()
    }
}

impl<T: BodyActuator + ?Sized> BodyActuator for Box<T> {
    fn stand_up(&mut self) -> HwResult<()> {
        (**self).stand_up()
    }
    fn relax_legs(&mut self) -> HwResult<()> {
        (**self).relax_legs()
    }
    fn walk_continuously(&mut self, heading_deg: f64, speed: f64) -> HwResult<()> {
        (**self).walk_continuously(heading_deg, speed)
    }
    fn stop_walking(&mut self) -> HwResult<()> {
        (**self).stop_walking()
    }
    fn set_leg_positions(
        &mut self,
        positions: &LegPositions,
        duration: Duration,
    ) -> HwResult<()> {
        (**self).set_leg_positions(positions, duration)
    }
}

impl<T: RangeSensor + ?Sized> RangeSensor for Box<T> {
    fn distance_mm(&mut self) -> HwResult<f64> {
        (**self).distance_mm()
    }
}

impl<T: InclinationSensor + ?Sized> InclinationSensor for Box<T> {
    fn start(&mut self) -> HwResult<()> {
        (**self).start()
    }
    fn read(&mut self) -> HwResult<(f64, f64)> {
        (**self).read()
    }
    fn stop(&mut self) -> HwResult<()> {
        (**self).stop()
    }
}
