//! Maps `Box<dyn Error>` from trait boundaries to typed `PatrolError`.
//!
//! The traits in `patrol_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `patrol_hardware::HwError`.

use crate::error::PatrolError;

/// Map a trait-boundary error to a typed `PatrolError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> PatrolError {
    #[cfg(feature = "hardware-errors")]
    {
        use patrol_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout | HwError::EchoTimeout => PatrolError::Timeout,
                other => PatrolError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        PatrolError::Timeout
    } else {
        PatrolError::Hardware(s)
    }
}

/// Run a best-effort actuation: failures are logged and swallowed so the
/// control loop keeps going. Returns whether the call succeeded.
pub(crate) fn actuate(op: &'static str, res: patrol_traits::HwResult<()>) -> bool {
    match res {
        Ok(()) => true,
        Err(e) => {
            let err = map_hw_error(&*e);
            tracing::warn!(op, error = %err, "actuator command failed");
            false
        }
    }
}
