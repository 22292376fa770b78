//! Scripted leg placements.
use std::fmt;
use std::time::Duration;

use patrol_traits::{BodyActuator, LEG_COUNT, LegPosition, LegPositions};

use crate::hw_error::map_hw_error;

/// Front legs forward and low.
const FRONT_LEFT: LegPosition = LegPosition::new(55.0, 170.0, -20.0);
const FRONT_RIGHT: LegPosition = LegPosition::new(-55.0, 170.0, -20.0);
const BOW_MOVE: Duration = Duration::from_millis(2000);
const WAVE_MOVE: Duration = Duration::from_millis(400);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Posture {
    /// "posture-A": front legs down and forward, rear legs raised.
    #[default]
    PowerBow,
    /// "posture-B": legs lowered one by one from a relaxed stance, followed
    /// by a tilt check.
    PowerWave,
}

impl Posture {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PowerBow => "posture-A",
            Self::PowerWave => "posture-B",
        }
    }

    /// Whether the posture needs a level chassis and so runs tilt recovery.
    pub fn requires_level(self) -> bool {
        matches!(self, Self::PowerWave)
    }

    /// Leg moves making up the posture. Positions accumulate: each step keeps
    /// the targets of the previous ones.
    pub fn leg_steps(self) -> Vec<(LegPositions, Duration)> {
        match self {
            Self::PowerBow => {
                let mut lp = LegPositions::new();
                lp.set(0, FRONT_LEFT).set(1, FRONT_RIGHT);
                let front = lp.clone();
                lp.set(2, LegPosition::new(0.0, 120.0, 80.0))
                    .set(3, LegPosition::new(-30.0, 60.0, 130.0))
                    .set(4, LegPosition::new(30.0, 60.0, 130.0))
                    .set(5, LegPosition::new(0.0, 120.0, 80.0));
                vec![(front, BOW_MOVE), (lp, BOW_MOVE)]
            }
            Self::PowerWave => {
                let mut lp = LegPositions::new();
                (0..LEG_COUNT)
                    .map(|leg| {
                        lp.set(leg, FRONT_LEFT);
                        (lp.clone(), WAVE_MOVE)
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for Posture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<patrol_config::PostureName> for Posture {
    fn from(p: patrol_config::PostureName) -> Self {
        match p {
            patrol_config::PostureName::PostureA => Self::PowerBow,
            patrol_config::PostureName::PostureB => Self::PowerWave,
        }
    }
}

/// Play `steps` in order. A rejected move is logged and the sequence
/// continues with the next one. Returns how many moves completed.
pub fn run_leg_steps<B>(body: &mut B, steps: &[(LegPositions, Duration)]) -> usize
where
    B: BodyActuator + ?Sized,
{
    let mut done = 0;
    for (i, (positions, duration)) in steps.iter().enumerate() {
        match body.set_leg_positions(positions, *duration) {
            Ok(()) => {
                tracing::debug!(step = i, "leg move complete");
                done += 1;
            }
            Err(e) => {
                let err = map_hw_error(&*e);
                tracing::warn!(step = i, error = %err, "leg move failed");
            }
        }
    }
    done
}
