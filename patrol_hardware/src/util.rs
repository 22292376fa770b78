use std::time::{Duration, Instant};

use crate::error::{HwError, Result};

/// Poll `is_level` until it returns true or `timeout` expires.
///
/// Returns the time spent waiting. Sleeps `poll_interval` between polls; pass
/// `Duration::ZERO` to spin when microsecond resolution matters (echo pulses).
pub fn wait_for_level_with_timeout(
    mut is_level: impl FnMut() -> bool,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    let start = Instant::now();
    let deadline = start + timeout;
    while !is_level() {
        if Instant::now() >= deadline {
            return Err(HwError::EchoTimeout);
        }
        if poll_interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(poll_interval);
        }
    }
    Ok(start.elapsed())
}

/// Convert an HC-SR04 echo pulse width to millimetres (speed of sound
/// 343 m/s, round trip).
#[inline]
pub fn echo_to_mm(pulse: Duration) -> f64 {
    pulse.as_secs_f64() * 343_000.0 / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_millisecond_echo_is_about_171mm() {
        let mm = echo_to_mm(Duration::from_millis(1));
        assert!((mm - 171.5).abs() < 1e-9);
    }
}
