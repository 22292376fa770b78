use std::cell::{Cell, RefCell};
use std::error::Error;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use patrol_core::{
    ArcSetting, PatrolCommand, PatrolLoop, PatrolMode, PatrolParams, Posture, ReactionCfg,
    ReactionDecision, ReactionPolicy, RunCommand, TiltCfg, build_patrol,
};
use patrol_core::mocks::NoInclination;
use patrol_hardware::SimInclination;
use patrol_traits::{
    BodyActuator, Clock, HeadActuator, InclinationSensor, LegPositions, ManualClock, RangeSensor,
    RotationDirection,
};
use rstest::rstest;

type HwResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Debug, Clone, PartialEq)]
enum Ev {
    MoveHead(f64),
    Rotate(RotationDirection),
    StopRotate,
    RelaxHead,
    Stand,
    RelaxLegs,
    Walk(f64, f64),
    StopWalk,
    Legs(usize),
    Mode(PatrolMode),
}

type Log = Rc<RefCell<Vec<Ev>>>;

/// Head whose bearing is set by the test.
struct SpyHead {
    log: Log,
    bearing: Rc<Cell<f64>>,
    bearing_fails: Rc<Cell<bool>>,
    clock: ManualClock,
}

impl HeadActuator for SpyHead {
    fn move_head_to(&mut self, bearing_deg: f64, duration: Duration) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::MoveHead(bearing_deg));
        self.bearing.set(bearing_deg);
        self.clock.sleep(duration);
        Ok(())
    }
    fn rotate_continuously(&mut self, dir: RotationDirection, _speed: f64) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::Rotate(dir));
        Ok(())
    }
    fn stop_rotating(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::StopRotate);
        Ok(())
    }
    fn current_bearing(&mut self) -> HwResult<f64> {
        if self.bearing_fails.get() {
            return Err(Box::new(std::io::Error::other("servo feedback lost")));
        }
        Ok(self.bearing.get())
    }
    fn relax_head(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::RelaxHead);
        Ok(())
    }
}

struct SpyBody {
    log: Log,
    clock: ManualClock,
    fail_walk: bool,
}

impl BodyActuator for SpyBody {
    fn stand_up(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::Stand);
        Ok(())
    }
    fn relax_legs(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::RelaxLegs);
        Ok(())
    }
    fn walk_continuously(&mut self, heading_deg: f64, speed: f64) -> HwResult<()> {
        if self.fail_walk {
            return Err(Box::new(std::io::Error::other("gait engine busy")));
        }
        self.log.borrow_mut().push(Ev::Walk(heading_deg, speed));
        Ok(())
    }
    fn stop_walking(&mut self) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::StopWalk);
        Ok(())
    }
    fn set_leg_positions(&mut self, p: &LegPositions, duration: Duration) -> HwResult<()> {
        self.log.borrow_mut().push(Ev::Legs(p.iter().count()));
        self.clock.sleep(duration);
        Ok(())
    }
}

/// Range sensor replaying a script, then repeating the last value.
struct SeqRange {
    seq: Vec<HwResult<f64>>,
    idx: usize,
    reads: Rc<Cell<usize>>,
}

impl RangeSensor for SeqRange {
    fn distance_mm(&mut self) -> HwResult<f64> {
        self.reads.set(self.reads.get() + 1);
        let i = self.idx.min(self.seq.len() - 1);
        self.idx += 1;
        match &self.seq[i] {
            Ok(v) => Ok(*v),
            Err(e) => Err(Box::new(std::io::Error::other(e.to_string()))),
        }
    }
}

/// Inclination sensor replaying a script; `None` entries fail the read.
struct SeqIncline {
    seq: Vec<Option<(f64, f64)>>,
    idx: usize,
}

impl InclinationSensor for SeqIncline {
    fn start(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn read(&mut self) -> HwResult<(f64, f64)> {
        let i = self.idx.min(self.seq.len() - 1);
        self.idx += 1;
        self.seq[i].ok_or_else(|| "i2c nack".into())
    }
    fn stop(&mut self) -> HwResult<()> {
        Ok(())
    }
}

struct Rig<I = SimInclination> {
    patrol: PatrolLoop<SpyHead, SpyBody, SeqRange, I>,
    log: Log,
    bearing: Rc<Cell<f64>>,
    bearing_fails: Rc<Cell<bool>>,
    reads: Rc<Cell<usize>>,
    clock: ManualClock,
}

impl<I> Rig<I> {
    fn events(&self) -> Vec<Ev> {
        self.log.borrow().clone()
    }

    fn clear(&self) {
        self.log.borrow_mut().clear();
    }
}

fn rig_with<I: InclinationSensor>(
    readings: Vec<HwResult<f64>>,
    incline: I,
    params: PatrolParams,
    fail_walk: bool,
) -> Rig<I> {
    let clock = ManualClock::new();
    let log: Log = Rc::default();
    let bearing = Rc::new(Cell::new(0.0));
    let bearing_fails = Rc::new(Cell::new(false));
    let reads = Rc::new(Cell::new(0));
    let head = SpyHead {
        log: log.clone(),
        bearing: bearing.clone(),
        bearing_fails: bearing_fails.clone(),
        clock: clock.clone(),
    };
    let body = SpyBody {
        log: log.clone(),
        clock: clock.clone(),
        fail_walk,
    };
    let range = SeqRange {
        seq: readings,
        idx: 0,
        reads: reads.clone(),
    };
    let shared: Arc<dyn Clock + Send + Sync> = Arc::new(clock.clone());
    let patrol = build_patrol(head, body, range, incline, Some(shared), params).expect("build");
    Rig {
        patrol,
        log,
        bearing,
        bearing_fails,
        reads,
        clock,
    }
}

fn rig(readings: &[f64]) -> Rig {
    rig_with(
        readings.iter().map(|v| Ok(*v)).collect(),
        SimInclination::level(),
        PatrolParams::default(),
        false,
    )
}

fn policy(policy: ReactionPolicy) -> PatrolParams {
    PatrolParams {
        reaction: ReactionCfg {
            policy,
            ..ReactionCfg::default()
        },
        ..PatrolParams::default()
    }
}

#[test]
fn activation_aligns_head_and_stays_idle() {
    let mut r = rig(&[1500.0]);
    r.patrol.on_activate();
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
    assert_eq!(r.events(), vec![Ev::MoveHead(0.0)]);
    assert_eq!(r.clock.elapsed(), Duration::from_millis(2000));

    // Already centered: idle ticks do not move the head again
    let out = r.patrol.tick();
    assert_eq!(out.mode, PatrolMode::Idle);
    assert_eq!(out.sleep, Duration::from_millis(1000));
    assert_eq!(r.events().len(), 1);
    assert_eq!(r.reads.get(), 0);
}

#[test]
fn start_scans_within_one_tick() {
    let mut r = rig(&[1500.0]);
    r.patrol.on_activate();
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    assert!(r.patrol.state().enabled);

    let out = r.patrol.tick();
    assert_eq!(out.mode, PatrolMode::Scanning);
    assert_eq!(out.sleep, Duration::from_millis(150));
    assert_eq!(out.reaction, ReactionDecision::None);
    assert!(r.events().contains(&Ev::Stand));
    assert_eq!(r.events().last(), Some(&Ev::Rotate(RotationDirection::Clockwise)));
    assert_eq!(r.reads.get(), 1);
}

#[test]
fn close_reading_reacts_and_returns_to_scanning() {
    let mut r = rig(&[1500.0, 100.0, 1500.0]);
    r.patrol.on_activate();
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.patrol.tick();
    r.clear();

    let before = r.clock.elapsed();
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::ApproachAndRetreat);
    assert_eq!(out.mode, PatrolMode::Scanning);
    // Half interval each way plus the cooldown
    assert_eq!(r.clock.elapsed() - before, Duration::from_millis(4000));

    let ev = r.events();
    let stop_at = ev.iter().position(|e| *e == Ev::StopRotate).expect("head stopped");
    assert!(
        ev[stop_at..].iter().all(|e| !matches!(e, Ev::Rotate(_))),
        "head rotated during the reaction: {ev:?}"
    );
    assert_eq!(
        ev[stop_at + 1..],
        [
            Ev::Walk(0.0, 0.2),
            Ev::StopWalk,
            Ev::Walk(180.0, 0.4),
            Ev::StopWalk,
        ]
    );
    assert_eq!(r.patrol.state().oscillator.config().walk_heading_deg, 180.0);
    assert_eq!(r.patrol.stats().reactions, 1);

    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::None);
    assert_eq!(out.mode, PatrolMode::Scanning);
}

#[test]
fn halt_policy_only_waits() {
    let mut r = rig_with(
        vec![Ok(120.0)],
        SimInclination::level(),
        policy(ReactionPolicy::HaltOnly),
        false,
    );
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.clear();
    let before = r.clock.elapsed();
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::Halt);
    assert_eq!(r.clock.elapsed() - before, Duration::from_millis(2000));
    assert!(!r.events().iter().any(|e| matches!(e, Ev::Walk(..))));
    assert!(r.events().contains(&Ev::StopRotate));
}

#[test]
fn trigger_posture_policy_disables_patrol() {
    let mut r = rig_with(
        vec![Ok(120.0)],
        SimInclination::level(),
        policy(ReactionPolicy::TriggerPosture(Posture::PowerBow)),
        false,
    );
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::TriggerPosture(Posture::PowerBow));
    assert_eq!(out.mode, PatrolMode::Idle);
    assert!(!r.patrol.state().enabled);
    assert!(r.events().contains(&Ev::Legs(6)));
}

#[test]
fn reversal_flips_rotation_immediately() {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.bearing.set(16.0);
    r.clear();
    let out = r.patrol.tick();
    assert!(out.reversed);
    assert_eq!(
        r.events(),
        vec![
            Ev::Rotate(RotationDirection::Clockwise),
            Ev::Rotate(RotationDirection::CounterClockwise),
        ]
    );
    assert_eq!(r.patrol.stats().reversals, 1);

    r.bearing.set(14.0);
    assert!(!r.patrol.tick().reversed);
}

#[rstest]
#[case(200.0)]
#[case(360.0)]
fn wide_arc_spins_without_reversing(#[case] arc: f64) {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand {
        run: Some(RunCommand::Start),
        arc: Some(ArcSetting::Degrees(arc)),
    });
    for bearing in [0.0, 90.0, 180.0, 270.0, 359.0] {
        r.bearing.set(bearing);
        let out = r.patrol.tick();
        assert!(!out.reversed);
        assert_eq!(out.sleep, Duration::from_millis(1000));
    }
    assert_eq!(r.reads.get(), 5);
}

#[rstest]
#[case(ArcSetting::Degrees(5.0))]
#[case(ArcSetting::Disabled)]
fn narrow_arc_holds_head_on_walk_heading(#[case] arc: ArcSetting) {
    let mut r = rig(&[100.0]);
    r.patrol.apply(PatrolCommand {
        run: Some(RunCommand::Start),
        arc: Some(arc),
    });
    // Start already centered the head; holding does not move it again
    assert_eq!(r.clock.elapsed(), Duration::from_millis(2000));
    r.clear();
    for _ in 0..3 {
        let out = r.patrol.tick();
        assert_eq!(out.reaction, ReactionDecision::None);
        assert_eq!(out.sleep, Duration::from_millis(1000));
    }
    assert_eq!(r.events(), vec![]);
    assert_eq!(r.reads.get(), 0);
}

#[test]
fn narrowing_the_arc_while_scanning_centers_once() {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.patrol.tick();
    r.clear();
    r.patrol.apply(PatrolCommand::arc(5.0));
    r.patrol.tick();
    r.patrol.tick();
    assert_eq!(r.events(), vec![Ev::StopRotate, Ev::MoveHead(0.0)]);
}

#[test]
fn stop_relaxes_head_then_recenters_once() {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.patrol.tick();
    r.clear();
    r.patrol.apply(PatrolCommand::run(RunCommand::Stop));
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
    r.patrol.tick();
    r.patrol.tick();
    assert_eq!(
        r.events(),
        vec![Ev::RelaxHead, Ev::StopRotate, Ev::MoveHead(0.0)]
    );
}

#[rstest]
#[case(RunCommand::Stand, vec![Ev::RelaxHead, Ev::Stand])]
#[case(RunCommand::Sit, vec![Ev::RelaxHead, Ev::RelaxLegs])]
#[case(RunCommand::PostureA, vec![Ev::RelaxHead, Ev::Stand, Ev::Legs(2), Ev::Legs(6)])]
fn run_commands_disable_patrol(#[case] cmd: RunCommand, #[case] expected: Vec<Ev>) {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.clear();
    r.patrol.apply(PatrolCommand::run(cmd));
    assert_eq!(r.events(), expected);
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
    assert!(!r.patrol.state().enabled);
}

fn legs_moves(ev: &[Ev]) -> usize {
    ev.iter().filter(|e| matches!(e, Ev::Legs(_))).count()
}

#[test]
fn power_wave_on_level_ground_does_not_walk() {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    let ev = r.events();
    assert_eq!(legs_moves(&ev), 6);
    assert!(!ev.iter().any(|e| matches!(e, Ev::Walk(..))));
    assert_eq!(r.patrol.stats().corrections, 0);
    assert_eq!(r.clock.elapsed(), Duration::from_millis(2400));
}

#[test]
fn power_wave_walks_toward_level_and_repeats() {
    // Baseline level, then tilted; the repeat sees the tilted value as its
    // own baseline and finds the chassis level.
    let incline = SimInclination::scripted(vec![(0.0, 0.0), (2.0, 0.0)]);
    let mut r = rig_with(vec![Ok(1500.0)], incline, PatrolParams::default(), false);
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    let ev = r.events();
    assert_eq!(ev.iter().filter(|e| **e == Ev::Walk(0.0, 0.2)).count(), 1);
    assert_eq!(legs_moves(&ev), 12);
    assert_eq!(r.patrol.stats().corrections, 1);
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
    // two wave sequences plus one settle walk
    assert_eq!(r.clock.elapsed(), Duration::from_millis(2400 * 2 + 5000));
}

#[test]
fn power_wave_correction_budget_is_bounded() {
    let incline = SimInclination::scripted(
        std::iter::repeat_n([(0.0, 0.0), (0.0, -3.0)], 5)
            .flatten()
            .collect(),
    );
    let mut r = rig_with(vec![Ok(1500.0)], incline, PatrolParams::default(), false);
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    let walks: Vec<Ev> = r
        .events()
        .into_iter()
        .filter(|e| matches!(e, Ev::Walk(..)))
        .collect();
    assert_eq!(walks, vec![Ev::Walk(270.0, 0.2)]);
    assert_eq!(r.patrol.stats().corrections, 1);
}

#[test]
fn failed_walk_does_not_stop_the_loop() {
    let mut r = rig_with(
        vec![Ok(100.0), Ok(1500.0)],
        SimInclination::level(),
        PatrolParams::default(),
        true,
    );
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::ApproachAndRetreat);
    assert_eq!(out.mode, PatrolMode::Scanning);
    assert_eq!(r.patrol.tick().mode, PatrolMode::Scanning);
}

#[test]
fn range_errors_count_as_no_reading() {
    let mut r = rig_with(
        vec![Err("echo timeout".into())],
        SimInclination::level(),
        PatrolParams::default(),
        false,
    );
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::None);
    assert_eq!(r.patrol.stats().reactions, 0);
}

#[test]
fn deactivate_stops_everything() {
    let mut r = rig(&[1500.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.clear();
    r.patrol.on_deactivate();
    assert_eq!(
        r.events(),
        vec![Ev::StopRotate, Ev::StopWalk, Ev::RelaxHead]
    );
    assert!(!r.patrol.state().enabled);
}

#[test]
fn lost_bearing_halts_instead_of_approaching_a_stale_one() {
    let mut r = rig(&[1500.0, 100.0]);
    r.patrol.apply(PatrolCommand::run(RunCommand::Start));
    r.bearing.set(12.0);
    assert_eq!(r.patrol.tick().reaction, ReactionDecision::None);

    r.bearing.set(250.0);
    r.bearing_fails.set(true);
    r.clear();
    let before = r.clock.elapsed();
    let out = r.patrol.tick();
    assert_eq!(out.reaction, ReactionDecision::Halt);
    assert_eq!(out.mode, PatrolMode::Scanning);
    assert!(!r.events().iter().any(|e| matches!(e, Ev::Walk(..))));
    assert!(r.events().contains(&Ev::StopRotate));
    assert_eq!(r.clock.elapsed() - before, Duration::from_millis(2000));
    assert_eq!(r.patrol.state().oscillator.config().walk_heading_deg, 0.0);
    assert_eq!(r.patrol.stats().reactions, 1);
}

fn walks(ev: &[Ev]) -> Vec<Ev> {
    ev.iter().filter(|e| matches!(e, Ev::Walk(..))).cloned().collect()
}

#[test]
fn power_wave_without_inclination_sensor_skips_recovery() {
    let mut r = rig_with(
        vec![Ok(1500.0)],
        NoInclination,
        PatrolParams::default(),
        false,
    );
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    let ev = r.events();
    assert_eq!(legs_moves(&ev), 6);
    assert!(walks(&ev).is_empty());
    assert_eq!(r.patrol.stats().corrections, 0);
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
}

#[test]
fn failed_live_tilt_read_skips_the_walk() {
    let incline = SeqIncline {
        seq: vec![Some((0.0, 0.0)), None],
        idx: 0,
    };
    let mut r = rig_with(vec![Ok(1500.0)], incline, PatrolParams::default(), false);
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    let ev = r.events();
    assert_eq!(legs_moves(&ev), 6);
    assert!(walks(&ev).is_empty());
    assert_eq!(r.patrol.stats().corrections, 0);
    assert_eq!(r.patrol.mode(), PatrolMode::Idle);
}

#[test]
fn zero_correction_budget_disables_recovery() {
    let params = PatrolParams {
        tilt: TiltCfg {
            max_corrections: 0,
            ..TiltCfg::default()
        },
        ..PatrolParams::default()
    };
    let incline = SimInclination::scripted(vec![(0.0, 0.0), (3.0, 0.0)]);
    let mut r = rig_with(vec![Ok(1500.0)], incline, params, false);
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));
    assert!(walks(&r.events()).is_empty());
    assert_eq!(legs_moves(&r.events()), 6);
    assert_eq!(r.patrol.stats().corrections, 0);
}

#[test]
fn corrective_walk_happens_in_recovering_mode() {
    let incline = SimInclination::scripted(vec![(0.0, 0.0), (2.0, 0.0)]);
    let mut r = rig_with(vec![Ok(1500.0)], incline, PatrolParams::default(), false);
    let log = r.log.clone();
    r.patrol
        .set_mode_observer(move |m| log.borrow_mut().push(Ev::Mode(m)));
    r.patrol.apply(PatrolCommand::run(RunCommand::PostureB));

    let ev = r.events();
    let modes: Vec<&Ev> = ev.iter().filter(|e| matches!(e, Ev::Mode(_))).collect();
    assert_eq!(
        modes,
        vec![
            &Ev::Mode(PatrolMode::PostureSequence),
            &Ev::Mode(PatrolMode::Recovering),
            &Ev::Mode(PatrolMode::PostureSequence),
            &Ev::Mode(PatrolMode::Idle),
        ]
    );
    let recovering = ev
        .iter()
        .position(|e| *e == Ev::Mode(PatrolMode::Recovering))
        .expect("entered recovering");
    assert_eq!(ev[recovering + 1], Ev::Walk(0.0, 0.2));
    assert_eq!(ev[recovering + 2], Ev::StopWalk);
    assert_eq!(ev[recovering + 3], Ev::Mode(PatrolMode::PostureSequence));
}
