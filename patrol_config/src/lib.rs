#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the head patrol controller.
//!
//! Every section is optional and falls back to the defaults the controller
//! ships with; `Config::validate` rejects values the control loop cannot use.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanCfg {
    /// Walk heading the sweep is centered on (degrees, [0, 360))
    pub walk_heading_deg: f64,
    /// Full sweep width in degrees. < 10 stares ahead, > 180 spins.
    pub arc_width_deg: f64,
    /// Continuous head rotation speed (deg/s, > 10 for smooth motion)
    pub scan_speed_dps: f64,
    /// Duration of the blocking head alignment move (ms)
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimingCfg {
    /// Lower bound on the tick sleep (ms)
    pub min_interval_ms: u64,
    /// Upper bound on the tick sleep (ms); also the idle tick
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

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReactionPolicy {
    /// Stop the head and wait out the cooldown
    Halt,
    /// Step toward the object, then back away from it
    #[default]
    ApproachAndRetreat,
    /// Run the configured posture sequence
    TriggerPosture,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostureName {
    /// Front legs raised, rear tucked: ready to receive power
    #[default]
    #[serde(rename = "posture-a", alias = "powerbow")]
    PostureA,
    /// Seated wave with tilt recovery
    #[serde(rename = "posture-b", alias = "powerwave")]
    PostureB,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReactionCfg {
    pub policy: ReactionPolicy,
    /// React when an object is closer than this (mm, 100..=1500)
    pub distance_mm: f64,
    /// Length of one maneuver and of the cooldown after it (ms)
    pub interval_ms: u64,
    /// Walking speed toward a target (0.1..=1.2 cm/s)
    pub approach_speed: f64,
    /// Posture used by `trigger_posture`
    pub posture: PostureName,
}

impl Default for ReactionCfg {
    fn default() -> Self {
        Self {
            policy: ReactionPolicy::ApproachAndRetreat,
            distance_mm: 250.0,
            interval_ms: 2000,
            approach_speed: 0.2,
            posture: PostureName::PostureA,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TiltCfg {
    /// Per-axis inclination divergence that counts as tilted
    pub tolerance: f64,
    /// Duration of one corrective walk (ms)
    pub settle_ms: u64,
    /// Corrective walks allowed per posture command (0 disables recovery)
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

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Hardware {
    /// Max wait for each HC-SR04 echo edge (ms)
    pub sensor_timeout_ms: u64,
    pub range_trig_pin: Option<u8>,
    pub range_echo_pin: Option<u8>,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            sensor_timeout_ms: 60,
            range_trig_pin: None,
            range_echo_pin: None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub scan: ScanCfg,
    pub timing: TimingCfg,
    pub reaction: ReactionCfg,
    pub tilt: TiltCfg,
    pub logging: Logging,
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file; validation is left to the caller.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Scan
        let heading = self.scan.walk_heading_deg;
        if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
            eyre::bail!("scan.walk_heading_deg must be in [0, 360)");
        }
        if !self.scan.arc_width_deg.is_finite() {
            eyre::bail!("scan.arc_width_deg must be finite");
        }
        if !(self.scan.scan_speed_dps.is_finite() && self.scan.scan_speed_dps > 0.0) {
            eyre::bail!("scan.scan_speed_dps must be > 0");
        }
        if self.scan.head_align_ms > 60_000 {
            eyre::bail!("scan.head_align_ms is unreasonably large (>60s)");
        }

        // Timing
        if self.timing.min_interval_ms == 0 {
            eyre::bail!("timing.min_interval_ms must be >= 1");
        }
        if self.timing.min_interval_ms > self.timing.max_interval_ms {
            eyre::bail!("timing.min_interval_ms must be <= timing.max_interval_ms");
        }
        if self.timing.max_interval_ms > 60_000 {
            eyre::bail!("timing.max_interval_ms is unreasonably large (>60s)");
        }

        // Reaction
        if !(100.0..=1500.0).contains(&self.reaction.distance_mm) {
            eyre::bail!("reaction.distance_mm must be in [100, 1500]");
        }
        if self.reaction.interval_ms == 0 {
            eyre::bail!("reaction.interval_ms must be >= 1");
        }
        if !(self.reaction.approach_speed > 0.0 && self.reaction.approach_speed <= 1.2) {
            eyre::bail!("reaction.approach_speed must be in (0.0, 1.2]");
        }

        // Tilt
        if !(self.tilt.tolerance.is_finite() && self.tilt.tolerance > 0.0) {
            eyre::bail!("tilt.tolerance must be > 0");
        }
        if self.tilt.settle_ms > 60_000 {
            eyre::bail!("tilt.settle_ms is unreasonably large (>60s)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Hardware
        if self.hardware.sensor_timeout_ms == 0 {
            eyre::bail!("hardware.sensor_timeout_ms must be >= 1");
        }
        if self.hardware.range_trig_pin.is_some() != self.hardware.range_echo_pin.is_some() {
            eyre::bail!("hardware.range_trig_pin and hardware.range_echo_pin must be set together");
        }

        Ok(())
    }
}
