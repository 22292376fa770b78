//! Type-state builder for `Patrol` and the generic `build_patrol` constructor.
//!
//! `build()` only exists once head, body and range sensor are provided;
//! `try_build()` is always available and reports what is missing.

use std::marker::PhantomData;
use std::sync::Arc;

use patrol_traits::{
    BodyActuator, Clock, HeadActuator, InclinationSensor, MonotonicClock, RangeSensor,
};

use crate::config::{PatrolParams, ScanCfg, TimingCfg};
use crate::error::{BuildError, Result};
use crate::mocks::NoInclination;
use crate::patrol::PatrolLoop;

/// Patrol loop over boxed devices, as assembled by [`PatrolBuilder`].
pub type Patrol = PatrolLoop<
    Box<dyn HeadActuator>,
    Box<dyn BodyActuator>,
    Box<dyn RangeSensor>,
    Box<dyn InclinationSensor>,
>;

pub struct Missing;
pub struct Set;

pub struct PatrolBuilder<H, B, R> {
    head: Option<Box<dyn HeadActuator>>,
    body: Option<Box<dyn BodyActuator>>,
    range: Option<Box<dyn RangeSensor>>,
    incline: Option<Box<dyn InclinationSensor>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    params: PatrolParams,
    _h: PhantomData<H>,
    _b: PhantomData<B>,
    _r: PhantomData<R>,
}

impl Default for PatrolBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            head: None,
            body: None,
            range: None,
            incline: None,
            clock: None,
            params: PatrolParams::default(),
            _h: PhantomData,
            _b: PhantomData,
            _r: PhantomData,
        }
    }
}

impl Patrol {
    pub fn builder() -> PatrolBuilder<Missing, Missing, Missing> {
        PatrolBuilder::default()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

/// Reject parameters the loop cannot run with.
pub fn validate_params(p: &PatrolParams) -> Result<()> {
    let heading = p.scan.walk_heading_deg;
    if !heading.is_finite() || !(0.0..360.0).contains(&heading) {
        return Err(invalid("walk heading must be in [0, 360)"));
    }
    if !p.scan.arc_width_deg.is_finite() {
        return Err(invalid("arc width must be finite"));
    }
    if !(p.scan.scan_speed_dps.is_finite() && p.scan.scan_speed_dps > 0.0) {
        return Err(invalid("scan speed must be > 0"));
    }
    if p.timing.min_interval_ms == 0 || p.timing.min_interval_ms > p.timing.max_interval_ms {
        return Err(invalid("interval bounds must satisfy 1 <= min <= max"));
    }
    if !(p.reaction.distance_mm.is_finite() && p.reaction.distance_mm > 0.0) {
        return Err(invalid("reaction distance must be > 0"));
    }
    if p.reaction.interval_ms == 0 {
        return Err(invalid("reaction interval must be >= 1 ms"));
    }
    if !(p.reaction.approach_speed.is_finite() && p.reaction.approach_speed > 0.0) {
        return Err(invalid("approach speed must be > 0"));
    }
    if !(p.tilt.tolerance.is_finite() && p.tilt.tolerance > 0.0) {
        return Err(invalid("tilt tolerance must be > 0"));
    }
    Ok(())
}

/// Validate `params` and assemble a loop over concrete device types.
/// Without a clock the loop runs on `MonotonicClock`.
pub fn build_patrol<H, B, R, I>(
    head: H,
    body: B,
    range: R,
    incline: I,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    params: PatrolParams,
) -> Result<PatrolLoop<H, B, R, I>>
where
    H: HeadActuator,
    B: BodyActuator,
    R: RangeSensor,
    I: InclinationSensor,
{
    validate_params(&params)?;
    let clock = clock.unwrap_or_else(|| Arc::new(MonotonicClock::new()));
    Ok(PatrolLoop::new(head, body, range, incline, clock, params))
}

impl<H, B, R> PatrolBuilder<H, B, R> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<Patrol> {
        let head = self
            .head
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHead))?;
        let body = self
            .body
            .ok_or_else(|| eyre::Report::new(BuildError::MissingBody))?;
        let range = self
            .range
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRange))?;
        let incline = self
            .incline
            .unwrap_or_else(|| Box::new(NoInclination));
        build_patrol(head, body, range, incline, self.clock, self.params)
    }

    pub fn with_inclination(mut self, sensor: impl InclinationSensor + 'static) -> Self {
        self.incline = Some(Box::new(sensor));
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_params(mut self, params: PatrolParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_scan(mut self, scan: ScanCfg) -> Self {
        self.params.scan = scan;
        self
    }

    pub fn with_timing(mut self, timing: TimingCfg) -> Self {
        self.params.timing = timing;
        self
    }

}

// Setters that advance type-state
impl<B, R> PatrolBuilder<Missing, B, R> {
    pub fn with_head(self, head: impl HeadActuator + 'static) -> PatrolBuilder<Set, B, R> {
        PatrolBuilder {
            head: Some(Box::new(head)),
            body: self.body,
            range: self.range,
            incline: self.incline,
            clock: self.clock,
            params: self.params,
            _h: PhantomData,
            _b: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<H, R> PatrolBuilder<H, Missing, R> {
    pub fn with_body(self, body: impl BodyActuator + 'static) -> PatrolBuilder<H, Set, R> {
        PatrolBuilder {
            head: self.head,
            body: Some(Box::new(body)),
            range: self.range,
            incline: self.incline,
            clock: self.clock,
            params: self.params,
            _h: PhantomData,
            _b: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<H, B> PatrolBuilder<H, B, Missing> {
    pub fn with_range(self, range: impl RangeSensor + 'static) -> PatrolBuilder<H, B, Set> {
        PatrolBuilder {
            head: self.head,
            body: self.body,
            range: Some(Box::new(range)),
            incline: self.incline,
            clock: self.clock,
            params: self.params,
            _h: PhantomData,
            _b: PhantomData,
            _r: PhantomData,
        }
    }
}

impl PatrolBuilder<Set, Set, Set> {
    pub fn build(self) -> Result<Patrol> {
        self.try_build()
    }
}
