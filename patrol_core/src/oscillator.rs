//! Scan direction state and the reversal decision.

use patrol_traits::RotationDirection;

use crate::angle::{MAX_REVERSING_ARC_DEG, MIN_ACTIVE_ARC_DEG, clamp_arc, normalize_arc};

/// Geometry of the sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    pub walk_heading_deg: f64,
    pub arc_width_deg: f64,
    pub scan_speed_dps: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            walk_heading_deg: 0.0,
            arc_width_deg: 30.0,
            scan_speed_dps: 20.0,
        }
    }
}

/// Mutable part of the sweep, updated once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanState {
    pub direction: RotationDirection,
    pub head_bearing_deg: f64,
}

/// How the head behaves for a given arc width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepMode {
    /// Arc below the active threshold: head held on the walk heading.
    Stare,
    /// Normal back-and-forth sweep.
    Sweep,
    /// Arc above 180: continuous rotation, never reversed.
    Spin,
}

impl SweepMode {
    pub fn for_arc(arc_width_deg: f64) -> Self {
        if arc_width_deg.is_nan() || arc_width_deg < MIN_ACTIVE_ARC_DEG {
            Self::Stare
        } else if arc_width_deg > MAX_REVERSING_ARC_DEG {
            Self::Spin
        } else {
            Self::Sweep
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanOscillator {
    config: ScanConfig,
    state: ScanState,
}

impl ScanOscillator {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            state: ScanState::default(),
        }
    }

    /// Whether the head at `head_bearing` has crossed the arc edge it is
    /// currently rotating toward.
    pub fn should_reverse(&self, head_bearing: f64) -> bool {
        let arc = clamp_arc(self.config.arc_width_deg);
        let heading = self.config.walk_heading_deg;
        let adjusted = normalize_arc(head_bearing, heading, arc);
        match self.state.direction {
            RotationDirection::CounterClockwise => adjusted < heading - arc / 2.0,
            RotationDirection::Clockwise => adjusted > heading + arc / 2.0,
        }
    }

    /// Record `head_bearing` and flip the direction when the edge policy
    /// calls for it. Returns `true` when the direction changed.
    pub fn advance(&mut self, head_bearing: f64) -> bool {
        self.state.head_bearing_deg = head_bearing;
        let flip = match self.mode() {
            SweepMode::Sweep => self.should_reverse(head_bearing),
            SweepMode::Stare | SweepMode::Spin => false,
        };
        if flip {
            self.state.direction = self.state.direction.reversed();
        }
        flip
    }

    pub fn mode(&self) -> SweepMode {
        SweepMode::for_arc(self.config.arc_width_deg)
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn direction(&self) -> RotationDirection {
        self.state.direction
    }

    pub fn set_direction(&mut self, direction: RotationDirection) {
        self.state.direction = direction;
    }

    pub fn set_arc_width(&mut self, arc_width_deg: f64) {
        self.config.arc_width_deg = arc_width_deg;
    }

    pub fn set_walk_heading(&mut self, walk_heading_deg: f64) {
        self.config.walk_heading_deg = walk_heading_deg;
    }
}
