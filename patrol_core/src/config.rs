//! Runtime configuration for the patrol loop.
//!
//! Separate from the TOML schema in `patrol_config`; see `conversions` for
//! the bridge.
use std::time::Duration;

use crate::oscillator::ScanConfig;
use crate::reaction::ReactionPolicy;

/// Sweep geometry and head alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCfg {
    /// Initial walk heading, degrees in [0, 360).
    pub walk_heading_deg: f64,
    /// Initial arc width. < 10 stares, > 180 spins.
    pub arc_width_deg: f64,
    /// Continuous rotation speed in deg/s.
    pub scan_speed_dps: f64,
    /// Blocking head alignment duration.
    pub head_align_ms: u64,
}

impl Default for ScanCfg {
    fn default() -> Self {
        Self {
            walk_heading_deg: 0.0,
            arc_width_deg: 30.0,
            scan_speed_dps: 20.0,
            head_align_ms: 2000,
        }
    }
}

impl ScanCfg {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            walk_heading_deg: self.walk_heading_deg,
            arc_width_deg: self.arc_width_deg,
            scan_speed_dps: self.scan_speed_dps,
        }
    }

    pub fn head_align(&self) -> Duration {
        Duration::from_millis(self.head_align_ms)
    }
}

/// Bounds on the per-tick sleep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingCfg {
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
}

impl Default for TimingCfg {
    fn default() -> Self {
        Self {
            min_interval_ms: 100,
            max_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReactionCfg {
    pub policy: ReactionPolicy,
    /// React below this distance (mm).
    pub distance_mm: f64,
    /// Maneuver length and cooldown (ms).
    pub interval_ms: u64,
    pub approach_speed: f64,
}

impl Default for ReactionCfg {
    fn default() -> Self {
        Self {
            policy: ReactionPolicy::ApproachAndRetreat,
            distance_mm: 250.0,
            interval_ms: 2000,
            approach_speed: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TiltCfg {
    pub tolerance: f64,
    pub settle_ms: u64,
    /// Corrective walks per posture command. 0 disables recovery.
    pub max_corrections: u32,
}

impl Default for TiltCfg {
    fn default() -> Self {
        Self {
            tolerance: 1.5,
            settle_ms: 5000,
            max_corrections: 1,
        }
    }
}

/// Everything the loop needs besides its devices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatrolParams {
    pub scan: ScanCfg,
    pub timing: TimingCfg,
    pub reaction: ReactionCfg,
    pub tilt: TiltCfg,
}
