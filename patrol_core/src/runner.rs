//! Tick-driven driver around `PatrolLoop`.
use std::time::Duration;

use patrol_traits::{BodyActuator, HeadActuator, InclinationSensor, RangeSensor};

use crate::inbox::CommandInbox;
use crate::patrol::PatrolLoop;
use crate::shutdown::ShutdownToken;
use crate::status::PatrolMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    /// `max_runtime` elapsed.
    Deadline,
}

/// What a session did, for the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub reactions: u64,
    pub reversals: u64,
    pub corrections: u64,
    pub final_mode: PatrolMode,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// Activate the loop and tick it until `shutdown` fires or `max_runtime`
/// elapses on the loop's clock. Pending commands are applied at the top of
/// each tick. The loop is deactivated before returning.
///
/// The shutdown flag is only checked between steps; a reaction or posture
/// already in progress runs to completion.
pub fn run<H, B, R, I>(
    patrol: &mut PatrolLoop<H, B, R, I>,
    inbox: &CommandInbox,
    shutdown: &ShutdownToken,
    max_runtime: Option<Duration>,
) -> RunSummary
where
    H: HeadActuator,
    B: BodyActuator,
    R: RangeSensor,
    I: InclinationSensor,
{
    let clock = patrol.clock().clone();
    let started = clock.now();
    patrol.on_activate();

    let remaining = |now: std::time::Instant| {
        max_runtime.map(|max| max.saturating_sub(now.saturating_duration_since(started)))
    };

    let stop_reason = loop {
        if shutdown.is_triggered() {
            break StopReason::Shutdown;
        }
        if remaining(clock.now()).is_some_and(|r| r.is_zero()) {
            break StopReason::Deadline;
        }
        if let Some(cmd) = inbox.drain() {
            tracing::debug!(?cmd, "applying command");
            patrol.apply(cmd);
        }
        if shutdown.is_triggered() {
            break StopReason::Shutdown;
        }

        let outcome = patrol.tick();
        tracing::trace!(
            mode = %outcome.mode,
            sleep_ms = u64::try_from(outcome.sleep.as_millis()).unwrap_or(u64::MAX),
            "tick"
        );
        let sleep = remaining(clock.now()).map_or(outcome.sleep, |r| r.min(outcome.sleep));
        clock.sleep(sleep);
    };

    let final_mode = patrol.mode();
    patrol.on_deactivate();
    let stats = patrol.stats();
    let summary = RunSummary {
        ticks: patrol.state().ticks,
        reactions: stats.reactions,
        reversals: stats.reversals,
        corrections: stats.corrections,
        final_mode,
        elapsed: clock.now().saturating_duration_since(started),
        stop_reason,
    };
    tracing::info!(
        ticks = summary.ticks,
        reactions = summary.reactions,
        reversals = summary.reversals,
        reason = ?summary.stop_reason,
        "patrol session ended"
    );
    summary
}
