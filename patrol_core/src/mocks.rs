//! Stand-in devices for rigs without the optional sensors.

use patrol_traits::{HwResult, InclinationSensor};

/// Inclination sensor for a rig that has none; every call fails, so tilt
/// checks are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInclination;

impl InclinationSensor for NoInclination {
    fn start(&mut self) -> HwResult<()> {
        Err(Box::new(crate::tilt::no_sensor()))
    }

    fn read(&mut self) -> HwResult<(f64, f64)> {
        Err(Box::new(crate::tilt::no_sensor()))
    }

    fn stop(&mut self) -> HwResult<()> {
        Ok(())
    }
}
