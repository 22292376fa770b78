#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core head patrol logic (hardware-agnostic).
//!
//! All hardware interactions go through the `patrol_traits` device traits and
//! every pause goes through `patrol_traits::Clock`.
//!
//! ## Architecture
//!
//! - **Angles**: arc clamping and seam normalization (`angle`)
//! - **Sweep**: direction state and reversal decision (`oscillator`)
//! - **Timing**: per-tick sleep from arc and speed (`scheduler`)
//! - **Reactions**: proximity check and maneuvers (`reaction`)
//! - **Tilt**: baseline capture and corrective walk (`tilt`)
//! - **Postures**: scripted leg placements (`posture`)
//! - **Commands**: JSON decoding and the single-slot inbox (`command`, `inbox`)
//! - **Loop**: `PatrolLoop` state machine and the tick driver (`patrol`, `runner`)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use patrol_core::{Patrol, PatrolCommand, PatrolMode, RunCommand};
//! use patrol_hardware::{SimBody, SimHead, SimRange};
//! use patrol_traits::{Clock, ManualClock};
//!
//! let clock: Arc<dyn Clock + Send + Sync> = Arc::new(ManualClock::new());
//! let mut patrol = Patrol::builder()
//!     .with_head(SimHead::new(clock.clone()))
//!     .with_body(SimBody::new(clock.clone()))
//!     .with_range(SimRange::constant(SimRange::CLEAR_MM))
//!     .with_clock(clock)
//!     .build()
//!     .unwrap();
//!
//! patrol.on_activate();
//! patrol.apply(PatrolCommand::run(RunCommand::Start));
//! let out = patrol.tick();
//! assert_eq!(out.mode, PatrolMode::Scanning);
//! assert_eq!(out.sleep.as_millis(), 150);
//! ```

pub mod angle;
pub mod builder;
pub mod command;
pub mod config;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod inbox;
pub mod mocks;
pub mod oscillator;
pub mod patrol;
pub mod posture;
pub mod reaction;
pub mod runner;
pub mod scheduler;
pub mod shutdown;
pub mod status;
pub mod tilt;

pub use angle::{clamp_arc, heading_from_inclination, normalize_arc, wrap_degrees};
pub use builder::{Missing, Patrol, PatrolBuilder, Set, build_patrol};
pub use command::{ArcSetting, CommandError, PatrolCommand, RunCommand, decode_json, decode_line};
pub use config::{PatrolParams, ReactionCfg, ScanCfg, TiltCfg, TimingCfg};
pub use error::{BuildError, PatrolError};
pub use inbox::{CommandInbox, CommandSender, command_inbox};
pub use oscillator::{ScanConfig, ScanOscillator, ScanState, SweepMode};
pub use patrol::{PatrolLoop, PatrolState, PatrolStats};
pub use posture::Posture;
pub use reaction::{ProximityReactor, ReactionDecision, ReactionEvent, ReactionPolicy};
pub use runner::{RunSummary, StopReason};
pub use scheduler::{IntervalScheduler, next_interval};
pub use shutdown::ShutdownToken;
pub use status::{PatrolMode, TickOutcome};
pub use tilt::{TiltAssessment, TiltBaseline, TiltRecovery};
