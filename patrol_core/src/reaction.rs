//! Proximity check and the maneuvers it can trigger.
use std::time::{Duration, Instant};

use patrol_traits::{BodyActuator, Clock};

use crate::angle::wrap_degrees;
use crate::hw_error::actuate;
use crate::posture::Posture;

/// What to do when something comes within range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionPolicy {
    HaltOnly,
    #[default]
    ApproachAndRetreat,
    TriggerPosture(Posture),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionDecision {
    None,
    Halt,
    ApproachAndRetreat,
    TriggerPosture(Posture),
}

impl ReactionDecision {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// The reading that triggered a maneuver. Lives for one maneuver only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionEvent {
    pub distance_mm: f64,
    pub at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityReactor {
    policy: ReactionPolicy,
    interval: Duration,
    approach_speed: f64,
}

impl Default for ProximityReactor {
    fn default() -> Self {
        Self {
            policy: ReactionPolicy::default(),
            interval: Duration::from_millis(2000),
            approach_speed: 0.2,
        }
    }
}

impl ProximityReactor {
    pub fn new(policy: ReactionPolicy, interval: Duration, approach_speed: f64) -> Self {
        Self {
            policy,
            interval,
            approach_speed,
        }
    }

    /// Length of one maneuver and of the cooldown that follows it.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether `distance_mm` calls for a reaction. Non-finite readings
    /// count as no reading.
    pub fn check(&self, distance_mm: f64, threshold_mm: f64) -> ReactionDecision {
        if !distance_mm.is_finite() || distance_mm >= threshold_mm {
            return ReactionDecision::None;
        }
        match self.policy {
            ReactionPolicy::HaltOnly => ReactionDecision::Halt,
            ReactionPolicy::ApproachAndRetreat => ReactionDecision::ApproachAndRetreat,
            ReactionPolicy::TriggerPosture(p) => ReactionDecision::TriggerPosture(p),
        }
    }

    /// Walk toward `bearing_deg` for half the interval, then away from it at
    /// double speed for the other half. Returns the new walk heading.
    pub fn approach_and_retreat<B>(&self, body: &mut B, clock: &dyn Clock, bearing_deg: f64) -> f64
    where
        B: BodyActuator + ?Sized,
    {
        let half = self.interval / 2;
        let retreat = wrap_degrees(bearing_deg + 180.0);

        tracing::info!(heading_deg = bearing_deg, "approaching target");
        actuate(
            "walk_continuously",
            body.walk_continuously(bearing_deg, self.approach_speed),
        );
        clock.sleep(half);
        actuate("stop_walking", body.stop_walking());

        tracing::info!(heading_deg = retreat, "retreating from target");
        actuate(
            "walk_continuously",
            body.walk_continuously(retreat, self.approach_speed * 2.0),
        );
        clock.sleep(self.interval - half);
        actuate("stop_walking", body.stop_walking());
        retreat
    }
}
