//! The `run` command: rig assembly, stdin transport and the patrol session.

use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use patrol_core::error::Result as CoreResult;
use patrol_core::runner::{RunSummary, StopReason};
use patrol_core::{
    CommandSender, Patrol, PatrolCommand, PatrolError, PatrolParams, RunCommand, ShutdownToken,
    command_inbox,
};
use patrol_hardware::{SimBody, SimHead, SimInclination, SimRange};
use patrol_traits::{Clock, ManualClock, MonotonicClock, RangeSensor};

/// Comma-separated distances (mm) the simulated range sensor cycles through.
pub const ENV_SIM_DISTANCES: &str = "PATROL_SIM_DISTANCES";
/// `ax,ay` the simulated inclination sensor reports after its first read.
pub const ENV_SIM_TILT: &str = "PATROL_SIM_TILT";

pub struct RunOptions {
    pub duration: Option<Duration>,
    pub virtual_time: bool,
    pub start: bool,
}

fn make_clock(virtual_time: bool) -> Arc<dyn Clock + Send + Sync> {
    if virtual_time {
        Arc::new(ManualClock::new())
    } else {
        Arc::new(MonotonicClock::new())
    }
}

fn sim_range() -> SimRange {
    match std::env::var(ENV_SIM_DISTANCES) {
        Ok(list) if !list.trim().is_empty() => SimRange::from_list(&list),
        _ => SimRange::constant(SimRange::CLEAR_MM),
    }
}

fn sim_inclination() -> SimInclination {
    match std::env::var(ENV_SIM_TILT) {
        Ok(pair) => SimInclination::from_pair(&pair),
        Err(_) => SimInclination::level(),
    }
}

/// Range sensor for this build: the HC-SR04 when built with `hardware` and
/// pins are configured, else the simulated one.
pub fn range_sensor(cfg: &patrol_config::Config) -> CoreResult<Box<dyn RangeSensor>> {
    #[cfg(feature = "hardware")]
    {
        if let (Some(trig), Some(echo)) = (cfg.hardware.range_trig_pin, cfg.hardware.range_echo_pin)
        {
            let timeout = Duration::from_millis(cfg.hardware.sensor_timeout_ms);
            let sensor = patrol_hardware::HardwareRange::new(trig, echo, timeout)
                .wrap_err("open hc-sr04 pins")?;
            tracing::info!(trig, echo, "using hc-sr04 range sensor");
            return Ok(Box::new(sensor));
        }
    }
    #[cfg(not(feature = "hardware"))]
    {
        let _ = cfg;
    }
    Ok(Box::new(sim_range()))
}

pub fn build_patrol(
    cfg: &patrol_config::Config,
    clock: Arc<dyn Clock + Send + Sync>,
) -> CoreResult<Patrol> {
    let range = range_sensor(cfg)?;
    Patrol::builder()
        .with_head(SimHead::new(clock.clone()))
        .with_body(SimBody::new(clock.clone()))
        .with_range(range)
        .with_inclination(sim_inclination())
        .with_clock(clock)
        .with_params(PatrolParams::from(cfg))
        .build()
}

/// Feed stdin lines into the inbox until EOF or until the loop goes away.
fn spawn_stdin_transport(tx: CommandSender) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            if let Err(PatrolError::State(_)) = tx.submit_line(&line) {
                break;
            }
        }
        tracing::debug!("command transport closed");
    });
}

pub fn run_patrol(
    cfg: &patrol_config::Config,
    opts: &RunOptions,
    shutdown: &ShutdownToken,
) -> CoreResult<RunSummary> {
    let clock = make_clock(opts.virtual_time);
    let mut patrol = build_patrol(cfg, clock)?;
    let (tx, inbox) = command_inbox();
    if opts.start {
        // The slot is empty before the transport starts
        let _ = tx.try_submit(PatrolCommand::run(RunCommand::Start));
    }
    spawn_stdin_transport(tx);

    tracing::info!(
        arc_width_deg = cfg.scan.arc_width_deg,
        policy = ?cfg.reaction.policy,
        virtual_time = opts.virtual_time,
        "patrol session start"
    );
    Ok(patrol_core::runner::run(
        &mut patrol,
        &inbox,
        shutdown,
        opts.duration,
    ))
}

/// Touch every simulated device once.
pub fn self_check(cfg: &patrol_config::Config) -> CoreResult<()> {
    use patrol_traits::{BodyActuator, HeadActuator, InclinationSensor, RotationDirection};

    let clock = make_clock(true);
    let hw = |e: Box<dyn std::error::Error + Send + Sync>| {
        eyre::Report::new(patrol_core::hw_error::map_hw_error(&*e))
    };

    let mut head = SimHead::new(clock.clone());
    head.move_head_to(0.0, Duration::ZERO).map_err(hw)?;
    head.rotate_continuously(RotationDirection::Clockwise, cfg.scan.scan_speed_dps)
        .map_err(hw)?;
    head.stop_rotating().map_err(hw)?;
    let bearing = head.current_bearing().map_err(hw)?;
    head.relax_head().map_err(hw)?;

    let mut body = SimBody::new(clock);
    body.stand_up().map_err(hw)?;
    body.relax_legs().map_err(hw)?;

    let mut range = range_sensor(cfg)?;
    let mm = range
        .distance_mm()
        .map_err(hw)
        .wrap_err("range sensor read")?;

    let mut incline = sim_inclination();
    incline.start().map_err(hw)?;
    let (ax, ay) = incline.read().map_err(hw)?;
    incline.stop().map_err(hw)?;

    tracing::info!(bearing_deg = bearing, distance_mm = mm, ax, ay, "self-check readings");
    Ok(())
}

fn stop_reason_name(r: StopReason) -> &'static str {
    match r {
        StopReason::Shutdown => "shutdown",
        StopReason::Deadline => "deadline",
    }
}

/// One-line session report on stdout, text or JSON.
pub fn render_summary(s: &RunSummary, json: bool) -> String {
    let elapsed_ms = u64::try_from(s.elapsed.as_millis()).unwrap_or(u64::MAX);
    if json {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX));
        serde_json::json!({
            "timestamp": timestamp,
            "ticks": s.ticks,
            "reactions": s.reactions,
            "reversals": s.reversals,
            "corrections": s.corrections,
            "final_mode": s.final_mode.as_str(),
            "elapsed_ms": elapsed_ms,
            "stop_reason": stop_reason_name(s.stop_reason),
        })
        .to_string()
    } else {
        format!(
            "patrol finished: ticks={} reactions={} reversals={} corrections={} mode={} elapsed_ms={} reason={}",
            s.ticks,
            s.reactions,
            s.reversals,
            s.corrections,
            s.final_mode,
            elapsed_ms,
            stop_reason_name(s.stop_reason),
        )
    }
}
