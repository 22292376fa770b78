//! The patrol control loop.
//!
//! `PatrolLoop` owns every device and the whole patrol state. Commands are
//! applied between ticks through [`PatrolLoop::apply`]; one call to
//! [`PatrolLoop::tick`] runs one control step and returns how long to sleep.
use std::sync::Arc;
use std::time::Duration;

use patrol_traits::{BodyActuator, Clock, HeadActuator, InclinationSensor, RangeSensor};

use crate::command::{ArcSetting, PatrolCommand, RunCommand};
use crate::config::PatrolParams;
use crate::hw_error::{actuate, map_hw_error};
use crate::oscillator::{ScanOscillator, SweepMode};
use crate::posture::{Posture, run_leg_steps};
use crate::reaction::{ProximityReactor, ReactionDecision, ReactionEvent};
use crate::scheduler::IntervalScheduler;
use crate::status::{PatrolMode, TickOutcome};
use crate::tilt::{TiltAssessment, TiltRecovery};

/// Mutable patrol state, owned by the loop.
#[derive(Debug, Clone, Default)]
pub struct PatrolState {
    pub mode: PatrolMode,
    pub enabled: bool,
    pub oscillator: ScanOscillator,
    /// Head is already centered on the walk heading.
    pub head_parked: bool,
    pub ticks: u64,
}

/// Counters for the session summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatrolStats {
    pub reactions: u64,
    pub reversals: u64,
    pub corrections: u64,
}

pub struct PatrolLoop<H, B, R, I> {
    head: H,
    body: B,
    range: R,
    incline: I,
    clock: Arc<dyn Clock + Send + Sync>,
    params: PatrolParams,
    scheduler: IntervalScheduler,
    reactor: ProximityReactor,
    tilt: TiltRecovery,
    state: PatrolState,
    stats: PatrolStats,
    mode_observer: Option<Box<dyn FnMut(PatrolMode)>>,
}

impl<H, B, R, I> core::fmt::Debug for PatrolLoop<H, B, R, I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PatrolLoop")
            .field("params", &self.params)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<H, B, R, I> PatrolLoop<H, B, R, I>
where
    H: HeadActuator,
    B: BodyActuator,
    R: RangeSensor,
    I: InclinationSensor,
{
    pub(crate) fn new(
        head: H,
        body: B,
        range: R,
        incline: I,
        clock: Arc<dyn Clock + Send + Sync>,
        params: PatrolParams,
    ) -> Self {
        let scheduler = IntervalScheduler::new(
            Duration::from_millis(params.timing.min_interval_ms),
            Duration::from_millis(params.timing.max_interval_ms),
        );
        let reactor = ProximityReactor::new(
            params.reaction.policy,
            Duration::from_millis(params.reaction.interval_ms),
            params.reaction.approach_speed,
        );
        let tilt = TiltRecovery::new(
            params.tilt.tolerance,
            Duration::from_millis(params.tilt.settle_ms),
            params.reaction.approach_speed,
        );
        let state = PatrolState {
            oscillator: ScanOscillator::new(params.scan.scan_config()),
            ..PatrolState::default()
        };
        Self {
            head,
            body,
            range,
            incline,
            clock,
            params,
            scheduler,
            reactor,
            tilt,
            state,
            stats: PatrolStats::default(),
            mode_observer: None,
        }
    }

    /// Reset to configured defaults (disabled, direction +1) and align the
    /// head with the walk heading.
    pub fn on_activate(&mut self) {
        self.state = PatrolState {
            oscillator: ScanOscillator::new(self.params.scan.scan_config()),
            ..PatrolState::default()
        };
        let heading = self.state.oscillator.config().walk_heading_deg;
        tracing::info!(heading_deg = heading, "patrol activated, aligning head");
        self.state.head_parked = actuate(
            "move_head_to",
            self.head.move_head_to(heading, self.params.scan.head_align()),
        );
    }

    /// Stop all motion and relax the head.
    pub fn on_deactivate(&mut self) {
        self.state.enabled = false;
        self.set_mode(PatrolMode::Idle);
        actuate("stop_rotating", self.head.stop_rotating());
        actuate("stop_walking", self.body.stop_walking());
        actuate("relax_head", self.head.relax_head());
        self.state.head_parked = false;
        tracing::info!(
            ticks = self.state.ticks,
            reactions = self.stats.reactions,
            "patrol deactivated"
        );
    }

    /// Apply a decoded command. The run part goes first, then the arc.
    pub fn apply(&mut self, cmd: PatrolCommand) {
        if let Some(run) = cmd.run {
            self.apply_run(run);
        }
        if let Some(arc) = cmd.arc {
            self.set_arc(arc);
        }
    }

    fn apply_run(&mut self, run: RunCommand) {
        match run {
            RunCommand::Start => {
                actuate("stand_up", self.body.stand_up());
                let heading = self.state.oscillator.config().walk_heading_deg;
                self.state.head_parked = actuate(
                    "move_head_to",
                    self.head.move_head_to(heading, self.params.scan.head_align()),
                );
                self.state.enabled = true;
                self.set_mode(PatrolMode::Scanning);
                tracing::info!("starting head scan");
            }
            RunCommand::Stop => {
                self.disable();
                tracing::info!("stopping head scan");
            }
            RunCommand::Stand => {
                self.disable();
                actuate("stand_up", self.body.stand_up());
                tracing::info!("stopping head scan and standing by");
            }
            RunCommand::Sit => {
                self.disable();
                actuate("relax_legs", self.body.relax_legs());
                tracing::info!("stopping head scan and resting");
            }
            RunCommand::PostureA | RunCommand::PostureB => {
                self.disable();
                if let Some(p) = run.posture() {
                    self.run_posture(p);
                }
            }
        }
    }

    fn disable(&mut self) {
        self.state.enabled = false;
        self.set_mode(PatrolMode::Idle);
        actuate("relax_head", self.head.relax_head());
        self.state.head_parked = false;
    }

    fn set_arc(&mut self, arc: ArcSetting) {
        let width = arc.width_deg();
        self.state.oscillator.set_arc_width(width);
        match (arc, SweepMode::for_arc(width)) {
            (ArcSetting::Disabled, _) => tracing::info!("scan arc disabled"),
            (_, SweepMode::Sweep) => tracing::info!(arc_width_deg = width, "scan arc changed"),
            (_, SweepMode::Stare) => {
                tracing::info!(arc_width_deg = width, "staring straight ahead");
            }
            (_, SweepMode::Spin) => {
                tracing::info!(arc_width_deg = width, "scanning in all directions");
            }
        }
    }

    /// One control step. Never fails: actuator errors are logged and sensor
    /// errors count as no reading.
    pub fn tick(&mut self) -> TickOutcome {
        self.state.ticks += 1;
        let sweeping = self.state.enabled && self.state.oscillator.mode() != SweepMode::Stare;
        if sweeping {
            self.scan_tick()
        } else {
            self.hold_tick()
        }
    }

    fn scan_tick(&mut self) -> TickOutcome {
        let speed = self.state.oscillator.config().scan_speed_dps;
        self.state.head_parked = false;
        actuate(
            "rotate_continuously",
            self.head
                .rotate_continuously(self.state.oscillator.direction(), speed),
        );

        let mut reversed = false;
        let bearing = match self.head.current_bearing() {
            Ok(bearing) => {
                reversed = self.state.oscillator.advance(bearing);
                if reversed {
                    self.stats.reversals += 1;
                    tracing::debug!(bearing_deg = bearing, "scan direction reversed");
                    actuate(
                        "rotate_continuously",
                        self.head
                            .rotate_continuously(self.state.oscillator.direction(), speed),
                    );
                }
                Some(bearing)
            }
            Err(e) => {
                tracing::warn!(error = %map_hw_error(&*e), "head bearing unavailable");
                None
            }
        };

        let reaction = match self.range.distance_mm() {
            Ok(mm) => {
                let mut decision = self.reactor.check(mm, self.params.reaction.distance_mm);
                if decision == ReactionDecision::ApproachAndRetreat && bearing.is_none() {
                    // Nowhere to approach without a bearing read this tick
                    tracing::warn!(distance_mm = mm, "no head bearing, halting instead");
                    decision = ReactionDecision::Halt;
                }
                if !decision.is_none() {
                    let event = ReactionEvent {
                        distance_mm: mm,
                        at: self.clock.now(),
                    };
                    self.react(decision, event, bearing);
                }
                decision
            }
            Err(e) => {
                tracing::debug!(error = %map_hw_error(&*e), "no range reading this tick");
                ReactionDecision::None
            }
        };

        let cfg = self.state.oscillator.config();
        let sleep = self
            .scheduler
            .next_interval(cfg.arc_width_deg, cfg.scan_speed_dps);
        TickOutcome {
            mode: self.state.mode,
            sleep,
            reaction,
            reversed,
        }
    }

    fn hold_tick(&mut self) -> TickOutcome {
        if !self.state.head_parked {
            actuate("stop_rotating", self.head.stop_rotating());
            let heading = self.state.oscillator.config().walk_heading_deg;
            self.state.head_parked = actuate(
                "move_head_to",
                self.head.move_head_to(heading, self.params.scan.head_align()),
            );
            tracing::debug!(heading_deg = heading, "head centered");
        }
        TickOutcome {
            mode: self.state.mode,
            sleep: self.scheduler.max(),
            reaction: ReactionDecision::None,
            reversed: false,
        }
    }

    fn react(&mut self, decision: ReactionDecision, event: ReactionEvent, bearing: Option<f64>) {
        self.stats.reactions += 1;
        self.set_mode(PatrolMode::Reacting);
        tracing::info!(
            distance_mm = event.distance_mm,
            bearing_deg = ?bearing,
            decision = ?decision,
            "object in range"
        );
        actuate("stop_rotating", self.head.stop_rotating());

        match decision {
            ReactionDecision::None => {}
            ReactionDecision::Halt => {
                self.clock.sleep(self.reactor.interval());
            }
            ReactionDecision::ApproachAndRetreat => {
                if let Some(bearing) = bearing {
                    let heading =
                        self.reactor
                            .approach_and_retreat(&mut self.body, &*self.clock, bearing);
                    self.state.oscillator.set_walk_heading(heading);
                }
                self.clock.sleep(self.reactor.interval());
            }
            ReactionDecision::TriggerPosture(p) => {
                self.disable();
                self.run_posture(p);
                return;
            }
        }

        if self.state.enabled {
            self.set_mode(PatrolMode::Scanning);
        }
        tracing::debug!(
            held_ms = self.clock.ms_since(event.at),
            "reaction complete, resuming scan"
        );
    }

    /// Run a posture sequence to completion. Patrol stays disabled after.
    pub fn run_posture(&mut self, posture: Posture) {
        self.set_mode(PatrolMode::PostureSequence);
        tracing::info!(posture = %posture, "posture sequence");
        if posture.requires_level() {
            self.leveled_posture(posture);
        } else {
            actuate("stand_up", self.body.stand_up());
            run_leg_steps(&mut self.body, &posture.leg_steps());
        }
        self.set_mode(PatrolMode::Idle);
        self.state.head_parked = false;
    }

    /// Run `posture` from a relaxed stance, then walk toward level and
    /// repeat while the chassis is tilted and the correction budget lasts.
    fn leveled_posture(&mut self, posture: Posture) {
        let steps = posture.leg_steps();
        let mut corrections = 0u32;
        loop {
            actuate("stand_up", self.body.stand_up());
            let baseline = match self.tilt.capture_baseline(&mut self.incline) {
                Ok(b) => Some(b),
                Err(e) => {
                    tracing::warn!(error = %e, "tilt baseline unavailable, skipping tilt check");
                    None
                }
            };
            actuate("relax_legs", self.body.relax_legs());
            run_leg_steps(&mut self.body, &steps);
            actuate("relax_legs", self.body.relax_legs());

            let Some(baseline) = baseline else { break };
            let heading_deg = match self.tilt.check(&mut self.incline, baseline) {
                Ok(TiltAssessment::Level) => {
                    tracing::info!("chassis level");
                    break;
                }
                Ok(TiltAssessment::Tilted { heading_deg, .. }) => heading_deg,
                Err(e) => {
                    tracing::warn!(error = %e, "tilt check skipped");
                    break;
                }
            };
            if corrections >= self.params.tilt.max_corrections {
                tracing::warn!(
                    corrections,
                    "chassis still tilted, correction budget spent"
                );
                break;
            }
            corrections += 1;
            self.stats.corrections += 1;
            self.set_mode(PatrolMode::Recovering);
            self.tilt.correct(&mut self.body, &*self.clock, heading_deg);
            self.set_mode(PatrolMode::PostureSequence);
        }
    }

    pub fn mode(&self) -> PatrolMode {
        self.state.mode
    }

    pub fn state(&self) -> &PatrolState {
        &self.state
    }

    pub fn stats(&self) -> PatrolStats {
        self.stats
    }

    pub fn params(&self) -> &PatrolParams {
        &self.params
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    /// Call `observer` with every mode the loop enters, including the
    /// transient ones inside a reaction or posture sequence.
    pub fn set_mode_observer(&mut self, observer: impl FnMut(PatrolMode) + 'static) {
        self.mode_observer = Some(Box::new(observer));
    }

    fn set_mode(&mut self, mode: PatrolMode) {
        if self.state.mode == mode {
            return;
        }
        tracing::debug!(from = %self.state.mode, to = %mode, "mode change");
        self.state.mode = mode;
        if let Some(observer) = self.mode_observer.as_mut() {
            observer(mode);
        }
    }
}
