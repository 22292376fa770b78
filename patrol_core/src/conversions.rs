//! `From` implementations bridging `patrol_config` types to runtime types.

use crate::config::{PatrolParams, ReactionCfg, ScanCfg, TiltCfg, TimingCfg};
use crate::reaction::ReactionPolicy;

impl From<&patrol_config::ScanCfg> for ScanCfg {
    fn from(c: &patrol_config::ScanCfg) -> Self {
        Self {
            walk_heading_deg: c.walk_heading_deg,
            arc_width_deg: c.arc_width_deg,
            scan_speed_dps: c.scan_speed_dps,
            head_align_ms: c.head_align_ms,
        }
    }
}

impl From<&patrol_config::TimingCfg> for TimingCfg {
    fn from(c: &patrol_config::TimingCfg) -> Self {
        Self {
            min_interval_ms: c.min_interval_ms,
            max_interval_ms: c.max_interval_ms,
        }
    }
}

impl From<&patrol_config::ReactionCfg> for ReactionCfg {
    fn from(c: &patrol_config::ReactionCfg) -> Self {
        let policy = match c.policy {
            patrol_config::ReactionPolicy::Halt => ReactionPolicy::HaltOnly,
            patrol_config::ReactionPolicy::ApproachAndRetreat => ReactionPolicy::ApproachAndRetreat,
            patrol_config::ReactionPolicy::TriggerPosture => {
                ReactionPolicy::TriggerPosture(c.posture.into())
            }
        };
        Self {
            policy,
            distance_mm: c.distance_mm,
            interval_ms: c.interval_ms,
            approach_speed: c.approach_speed,
        }
    }
}

impl From<&patrol_config::TiltCfg> for TiltCfg {
    fn from(c: &patrol_config::TiltCfg) -> Self {
        Self {
            tolerance: c.tolerance,
            settle_ms: c.settle_ms,
            max_corrections: c.max_corrections,
        }
    }
}

impl From<&patrol_config::Config> for PatrolParams {
    fn from(c: &patrol_config::Config) -> Self {
        Self {
            scan: (&c.scan).into(),
            timing: (&c.timing).into(),
            reaction: (&c.reaction).into(),
            tilt: (&c.tilt).into(),
        }
    }
}
